#[tokio::main]
async fn main() {
    bistro::start_server().await;
}
