#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = schoolsync_rust::run().await {
        eprintln!("schoolsync-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
