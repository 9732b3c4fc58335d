#[tokio::main]
async fn main() {
    if let Err(error) = video_fetch_lib::run().await {
        eprintln!("Server error: {error}");
        std::process::exit(1);
    }
}
