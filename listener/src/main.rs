mod listen;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    listen::run().await
}
