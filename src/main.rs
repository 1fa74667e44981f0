#![allow(missing_docs)]

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    warehouse_deals_lib::run().await
}
