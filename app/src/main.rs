#[tokio::main]
async fn main() -> anyhow::Result<()> {
    salarysleuth::run().await
}
