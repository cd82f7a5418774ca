use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    atomkv_server::run().await
}
