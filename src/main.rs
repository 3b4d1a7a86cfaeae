#[tokio::main]
async fn main() -> anyhow::Result<()> {
    zabbix_reporter::app::main().await
}
