#[tokio::main]
async fn main() -> anyhow::Result<()> {
    practice_session::run().await
}
