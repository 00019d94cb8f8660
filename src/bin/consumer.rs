use order_queue::handlers::{DeadLetterInspector, SimulatedFailureHandler};
use order_queue::{BrokerConfig, BrokerConnection, OrderConsumer, OrderQueueError, QueueTopology};
use std::sync::Arc;

async fn run_consumers(config: &BrokerConfig) -> Result<(), OrderQueueError> {
    BrokerConnection::run_scoped(config, |channel| async move {
        QueueTopology::new(channel.clone())
            .declare(&config.main_queue, &config.dead_letter_queue)
            .await?;

        let consumer = OrderConsumer::new(channel).with_prefetch_count(config.prefetch_count);
        let main_queue = consumer.consume(&config.main_queue, Arc::new(SimulatedFailureHandler));
        let dead_letters = consumer.consume(&config.dead_letter_queue, Arc::new(DeadLetterInspector));

        log::info!("Consumer running. Press Ctrl+C to exit.");
        tokio::select! {
            result = async { tokio::try_join!(main_queue, dead_letters) } => {
                result?;
                log::info!("Subscriptions ended.");
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Ctrl+C received. Shutting down.");
            }
        }
        Ok(())
    })
    .await
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BrokerConfig::from_env();

    if let Err(e) = run_consumers(&config).await {
        log::error!("Consumer failed: {}", e);
        std::process::exit(1);
    }
}
