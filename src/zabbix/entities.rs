//! Management API objects, limited to the fields needed to find or create them.
//!
//! The server returns every scalar as a string (`"type": "2"`), while it accepts
//! integers on input; the code enums below read both forms.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Standard listening port of the monitoring agent, used for host interfaces.
pub const AGENT_PORT: &str = "10050";

macro_rules! numeric_code {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $code),+
        }

        impl $name {
            pub fn code(self) -> u8 {
                self as u8
            }

            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u8(self.code())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let code = deserialize_code(deserializer)?;
                $name::from_code(code).ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        "unknown {} code {}",
                        stringify!($name),
                        code
                    ))
                })
            }
        }
    };
}

fn deserialize_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Number(u8),
        Text(String),
    }

    match Code::deserialize(deserializer)? {
        Code::Number(code) => Ok(code),
        Code::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

numeric_code! {
    /// Storage type of an item's values.
    ValueType {
        Float = 0,
        Character = 1,
        Log = 2,
        Unsigned = 3,
        Text = 4,
    }
}

numeric_code! {
    /// Representation of an unsigned item. Only meaningful for [`ValueType::Unsigned`].
    DataType {
        Decimal = 0,
        Octal = 1,
        Hexadecimal = 2,
        Boolean = 3,
    }
}

numeric_code! {
    ItemType {
        Agent = 0,
        SnmpV1 = 1,
        Trapper = 2,
        Simple = 3,
        SnmpV2 = 4,
        Internal = 5,
        SnmpV3 = 6,
        ActiveAgent = 7,
        Aggregate = 8,
        WebItem = 9,
        External = 10,
        DatabaseMonitor = 11,
        Ipmi = 12,
        Ssh = 13,
        Telnet = 14,
        Calculated = 15,
        Jmx = 16,
        SnmpTrap = 17,
        Dependent = 18,
        HttpAgent = 19,
        Snmp = 20,
        Script = 21,
    }
}

numeric_code! {
    InterfaceType {
        Agent = 1,
        Snmp = 2,
        Ipmi = 3,
        Jmx = 4,
    }
}

/// What every provisioned object exposes: an id once it exists remotely, and a name.
pub trait RemoteObject {
    fn id(&self) -> Option<&str>;
    fn name(&self) -> &str;

    fn exists(&self) -> bool {
        self.id().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub groupid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRef {
    pub hostid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groupid: Option<String>,
    pub name: String,
}

impl HostGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            groupid: None,
            name: name.into(),
        }
    }

    pub fn to_ref(&self) -> Option<GroupRef> {
        self.groupid.clone().map(|groupid| GroupRef { groupid })
    }
}

impl RemoteObject for HostGroup {
    fn id(&self) -> Option<&str> {
        self.groupid.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInterface {
    #[serde(rename = "type")]
    pub interface_type: InterfaceType,
    pub main: u8,
    pub useip: u8,
    pub ip: String,
    pub dns: String,
    pub port: String,
}

impl HostInterface {
    /// Main agent interface bound to an IP address on the agent's standard port.
    pub fn agent(ip: impl Into<String>) -> Self {
        Self {
            interface_type: InterfaceType::Agent,
            main: 1,
            useip: 1,
            ip: ip.into(),
            dns: String::new(),
            port: AGENT_PORT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostid: Option<String>,
    pub host: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty", skip_deserializing)]
    pub interfaces: Vec<HostInterface>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", skip_deserializing)]
    pub groups: Vec<GroupRef>,
}

impl Host {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            hostid: None,
            host: host.into(),
            interfaces: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn to_ref(&self) -> Option<HostRef> {
        self.hostid.clone().map(|hostid| HostRef { hostid })
    }
}

impl RemoteObject for Host {
    fn id(&self) -> Option<&str> {
        self.hostid.as_deref()
    }

    fn name(&self) -> &str {
        &self.host
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templateid: Option<String>,
    pub host: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty", skip_deserializing)]
    pub groups: Vec<GroupRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<HostRef>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            templateid: None,
            host: name.clone(),
            name,
            groups: Vec::new(),
            hosts: Vec::new(),
        }
    }

    pub fn is_linked_to(&self, hostid: &str) -> bool {
        self.hosts.iter().any(|h| h.hostid == hostid)
    }
}

impl RemoteObject for Template {
    fn id(&self) -> Option<&str> {
        self.templateid.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicationid: Option<String>,
    pub hostid: String,
    pub name: String,
}

impl Application {
    pub fn new(name: impl Into<String>, hostid: impl Into<String>) -> Self {
        Self {
            applicationid: None,
            hostid: hostid.into(),
            name: name.into(),
        }
    }
}

impl RemoteObject for Application {
    fn id(&self) -> Option<&str> {
        self.applicationid.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itemid: Option<String>,
    pub name: String,
    #[serde(rename = "key_")]
    pub key: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub units: String,
    pub hostid: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty", skip_deserializing)]
    pub applications: Vec<String>,
}

impl Item {
    /// Item receiving pushed values, named after its key.
    pub fn trapper(
        key: impl Into<String>,
        units: impl Into<String>,
        value_type: ValueType,
        data_type: DataType,
        hostid: impl Into<String>,
    ) -> Self {
        let key = key.into();
        Self {
            itemid: None,
            name: key.clone(),
            key,
            item_type: ItemType::Trapper,
            value_type,
            data_type: (value_type == ValueType::Unsigned).then_some(data_type),
            units: units.into(),
            hostid: hostid.into(),
            applications: Vec::new(),
        }
    }
}

impl RemoteObject for Item {
    fn id(&self) -> Option<&str> {
        self.itemid.as_deref()
    }

    fn name(&self) -> &str {
        &self.key
    }
}
