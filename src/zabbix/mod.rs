//! Management API side: the objects a trapper item depends on, the JSON-RPC
//! client that manipulates them, and the cached synchronizer on top.

pub mod api;
pub mod client;
pub mod entities;
pub mod synchronizer;

pub use api::{ApiError, ZabbixApi};
pub use client::{ApiConfig, JsonRpcClient};
pub use entities::{
    AGENT_PORT, Application, DataType, GroupRef, Host, HostGroup, HostInterface, HostRef,
    InterfaceType, Item, ItemType, RemoteObject, Template, ValueType,
};
pub use synchronizer::{METRICS_HOST_GROUP, ResourceCache, ResourceSynchronizer};
