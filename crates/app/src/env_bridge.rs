//! Environmental bridge: polls external temperature sensors and relays their
//! readings onto the bus as DPT 9 group writes.
//!
//! Polling only happens while the bus is connected. An endpoint that fails
//! to answer or answers garbage is skipped until the next tick.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use knxhub_domain::address::GroupAddress;
use knxhub_domain::datapoint::{DatapointError, DatapointValue};
use knxhub_domain::error::HubError;
use knxhub_domain::sensor::{SensorEndpoint, SensorParseError};

use crate::bus_handle::BusHandle;
use crate::ports::{BusConnection, SensorSource};

#[derive(Debug, thiserror::Error)]
enum RelayError {
    #[error("fetching sensor reading failed")]
    Fetch(#[source] HubError),
    #[error("sensor response rejected")]
    Parse(#[from] SensorParseError),
    #[error("temperature cannot be encoded")]
    Encode(#[from] DatapointError),
    #[error("bus write to {address} failed")]
    Write {
        address: GroupAddress,
        #[source]
        source: HubError,
    },
}

/// Outcome of one polling round.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BridgeReport {
    pub relayed: usize,
    pub failed: usize,
}

pub struct EnvironmentalBridge<S, C> {
    source: S,
    endpoints: Vec<SensorEndpoint>,
    bus: BusHandle<C>,
    period: Duration,
}

impl<S, C> EnvironmentalBridge<S, C>
where
    S: SensorSource + 'static,
    C: BusConnection + 'static,
{
    pub fn new(source: S, endpoints: Vec<SensorEndpoint>, bus: BusHandle<C>, period: Duration) -> Self {
        Self {
            source,
            endpoints,
            bus,
            period,
        }
    }

    /// Spawn the polling loop. The first round runs immediately.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        tracing::info!(
            endpoints = self.endpoints.len(),
            period_secs = self.period.as_secs(),
            "environmental bridge started"
        );
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if !self.bus.is_connected() {
                tracing::debug!("bus not connected, skipping sensor poll");
                continue;
            }
            self.poll_and_relay().await;
        }
    }

    /// Poll every endpoint once and write its readings to the bus.
    pub async fn poll_and_relay(&self) -> BridgeReport {
        let mut report = BridgeReport::default();
        for endpoint in &self.endpoints {
            match self.relay(endpoint).await {
                Ok(()) => report.relayed += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(error = ?err, url = %endpoint.url, "sensor relay failed");
                }
            }
        }
        report
    }

    async fn relay(&self, endpoint: &SensorEndpoint) -> Result<(), RelayError> {
        let body = self.source.fetch(&endpoint.url).await.map_err(RelayError::Fetch)?;
        let reading = endpoint.parse(&body)?;

        let indoor = DatapointValue::Float16(reading.indoor).encode()?;
        let outdoor = DatapointValue::Float16(reading.outdoor).encode()?;

        self.write(endpoint.indoor_address, indoor).await?;
        self.write(endpoint.outdoor_address, outdoor).await?;
        tracing::debug!(
            url = %endpoint.url,
            indoor = reading.indoor,
            outdoor = reading.outdoor,
            "sensor reading relayed"
        );
        Ok(())
    }

    async fn write(&self, address: GroupAddress, payload: Vec<u8>) -> Result<(), RelayError> {
        self.bus
            .write(address, payload)
            .await
            .map_err(|source| RelayError::Write { address, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus_handle::tests::RecordingConnection;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct StaticSource(HashMap<String, String>);

    impl SensorSource for StaticSource {
        async fn fetch(&self, url: &str) -> Result<String, HubError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| HubError::Outbound(format!("no route to {url}").into()))
        }
    }

    fn ga(s: &str) -> GroupAddress {
        s.parse().unwrap()
    }

    fn endpoint(url: &str, indoor: &str, outdoor: &str) -> SensorEndpoint {
        SensorEndpoint {
            url: url.to_string(),
            indoor_key: "htemp".to_string(),
            outdoor_key: "otemp".to_string(),
            indoor_address: ga(indoor),
            outdoor_address: ga(outdoor),
        }
    }

    fn bridge(
        responses: &[(&str, &str)],
        endpoints: Vec<SensorEndpoint>,
    ) -> (EnvironmentalBridge<StaticSource, RecordingConnection>, Arc<RecordingConnection>) {
        let source = StaticSource(
            responses
                .iter()
                .map(|(url, body)| ((*url).to_string(), (*body).to_string()))
                .collect(),
        );
        let connection = Arc::new(RecordingConnection::default());
        let bus = BusHandle::new();
        bus.install(Arc::clone(&connection));
        (
            EnvironmentalBridge::new(source, endpoints, bus, Duration::from_secs(60)),
            connection,
        )
    }

    #[tokio::test]
    async fn should_write_both_temperatures_as_dpt9() {
        let (bridge, connection) = bridge(
            &[("http://aircon/sensor", "ret=OK,htemp=21.0,hhum=-,otemp=-30.0")],
            vec![endpoint("http://aircon/sensor", "3/0/1", "3/0/2")],
        );

        let report = bridge.poll_and_relay().await;

        assert_eq!(report, BridgeReport { relayed: 1, failed: 0 });
        assert_eq!(
            connection.writes.lock().unwrap().as_slice(),
            &[
                (ga("3/0/1"), vec![0x0C, 0x1A]),
                (ga("3/0/2"), vec![0x8A, 0x24]),
            ]
        );
    }

    #[tokio::test]
    async fn should_skip_failing_endpoint_and_relay_the_rest() {
        let (bridge, connection) = bridge(
            &[
                ("http://broken/sensor", "ret=PARAM NG"),
                ("http://ok/sensor", "ret=OK,htemp=21.0,otemp=21.0"),
            ],
            vec![
                endpoint("http://unreachable/sensor", "3/0/1", "3/0/2"),
                endpoint("http://broken/sensor", "3/1/1", "3/1/2"),
                endpoint("http://ok/sensor", "3/2/1", "3/2/2"),
            ],
        );

        let report = bridge.poll_and_relay().await;

        assert_eq!(report, BridgeReport { relayed: 1, failed: 2 });
        let writes = connection.writes.lock().unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, ga("3/2/1"));
    }

    #[tokio::test]
    async fn should_fail_every_endpoint_without_bus() {
        let (bridge, connection) = bridge(
            &[("http://ok/sensor", "ret=OK,htemp=21.0,otemp=21.0")],
            vec![endpoint("http://ok/sensor", "3/0/1", "3/0/2")],
        );
        connection
            .alive
            .store(false, std::sync::atomic::Ordering::SeqCst);

        let report = bridge.poll_and_relay().await;

        assert_eq!(report.failed, 1);
        assert!(connection.writes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_poll_while_disconnected() {
        let (bridge, connection) = bridge(
            &[("http://ok/sensor", "ret=OK,htemp=21.0,otemp=21.0")],
            vec![endpoint("http://ok/sensor", "3/0/1", "3/0/2")],
        );
        connection
            .alive
            .store(false, std::sync::atomic::Ordering::SeqCst);

        let task = bridge.start();
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert!(connection.writes.lock().unwrap().is_empty());

        connection
            .alive
            .store(true, std::sync::atomic::Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connection.writes.lock().unwrap().len(), 2);
        task.abort();
    }
}
