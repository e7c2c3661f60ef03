#[test]
fn init_installs_a_global_subscriber_once() {
    assert!(mediagraph_client::telemetry::init().is_ok());
    tracing::info!("telemetry installed");
    assert!(mediagraph_client::telemetry::init().is_err());
}
