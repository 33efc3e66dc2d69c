#[tokio::main]
async fn main() {
    slot_booking::run().await;
}
