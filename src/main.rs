#[tokio::main]
async fn main() {
    guide_backend::run().await;
}
