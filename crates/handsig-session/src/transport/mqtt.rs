// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! MQTT transport over `rumqttc`'s synchronous client

use super::{BrokerTransport, TransportEvent};
use crate::config::{ConnectOptions, DeliveryLevel};
use crate::error::TransportError;
use rumqttc::{
    Client, ConnectReturnCode, Connection, ConnectionError, Event, MqttOptions, Outgoing, Packet,
    QoS, RecvTimeoutError,
};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Outgoing request buffer between the client handle and its event loop
const REQUEST_CAPACITY: usize = 64;

/// Upper bound on driving the event loop after DISCONNECT is queued
const DISCONNECT_FLUSH: Duration = Duration::from_millis(500);

/// MQTT 3.1.1 broker link
///
/// The `rumqttc` event loop would silently reconnect if polled after an
/// error, so both halves are dropped as soon as the link fails.
#[derive(Default)]
pub struct MqttTransport {
    link: Option<(Client, Connection)>,
    in_flight: usize,
}

impl MqttTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn qos(level: DeliveryLevel) -> QoS {
        match level {
            DeliveryLevel::AtMostOnce => QoS::AtMostOnce,
            DeliveryLevel::AtLeastOnce => QoS::AtLeastOnce,
            DeliveryLevel::ExactlyOnce => QoS::ExactlyOnce,
        }
    }

    fn map_error(error: ConnectionError) -> TransportError {
        match error {
            ConnectionError::ConnectionRefused(code) => {
                TransportError::Refused(format!("{:?}", code))
            }
            other => TransportError::Io(other.to_string()),
        }
    }

    /// Drive the event loop until the queued DISCONNECT has been written.
    /// Returns `false` if the link failed or the deadline passed first.
    fn flush_disconnect(connection: &mut Connection, within: Duration) -> bool {
        let deadline = Instant::now() + within;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Outgoing(Outgoing::Disconnect))) => return true,
                Ok(Ok(event)) => trace!("[SESSION] MQTT event while closing: {:?}", event),
                Ok(Err(_)) | Err(_) => return false,
            }
        }
    }

    fn mqtt_options(client_id: &str, options: &ConnectOptions) -> MqttOptions {
        let mut mqtt = MqttOptions::new(
            client_id,
            options.endpoint.host.clone(),
            options.endpoint.port,
        );
        mqtt.set_keep_alive(options.keepalive_interval);
        mqtt.set_clean_session(true);
        if let Some(credentials) = &options.credentials {
            mqtt.set_credentials(
                credentials.username.clone(),
                credentials.password.clone().unwrap_or_default(),
            );
        }
        mqtt
    }
}

impl BrokerTransport for MqttTransport {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    fn open(&mut self, client_id: &str, options: &ConnectOptions) -> Result<(), TransportError> {
        self.close();

        let (client, mut connection) =
            Client::new(Self::mqtt_options(client_id, options), REQUEST_CAPACITY);
        let deadline = Instant::now() + options.connect_timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout(options.connect_timeout));
            }
            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(TransportError::Refused(format!("{:?}", ack.code)));
                    }
                    debug!("[SESSION] MQTT handshake complete with {}", options.endpoint);
                    self.link = Some((client, connection));
                    self.in_flight = 0;
                    return Ok(());
                }
                Ok(Ok(event)) => trace!("[SESSION] MQTT handshake event: {:?}", event),
                Ok(Err(e)) => return Err(Self::map_error(e)),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(TransportError::Timeout(options.connect_timeout))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TransportError::Io("event loop stopped".to_string()))
                }
            }
        }
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        level: DeliveryLevel,
    ) -> Result<(), TransportError> {
        let (client, _) = self.link.as_mut().ok_or(TransportError::NotOpen)?;
        client
            .try_publish(topic, Self::qos(level), false, payload.to_vec())
            .map_err(|e| TransportError::Rejected(e.to_string()))?;
        if level.is_acknowledged() {
            self.in_flight += 1;
        }
        Ok(())
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<TransportEvent>, TransportError> {
        let (_, connection) = self.link.as_mut().ok_or(TransportError::NotOpen)?;
        let lost = match connection.recv_timeout(timeout) {
            Ok(Ok(Event::Incoming(Packet::PubAck(_))))
            | Ok(Ok(Event::Incoming(Packet::PubComp(_)))) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                return Ok(Some(TransportEvent::Acknowledged));
            }
            Ok(Ok(Event::Incoming(Packet::PingResp))) => {
                return Ok(Some(TransportEvent::KeepAlive));
            }
            Ok(Ok(Event::Incoming(Packet::Disconnect))) => {
                "broker sent DISCONNECT".to_string()
            }
            Ok(Ok(event)) => {
                trace!("[SESSION] MQTT event: {:?}", event);
                return Ok(None);
            }
            Err(RecvTimeoutError::Timeout) => return Ok(None),
            Ok(Err(e)) => e.to_string(),
            Err(RecvTimeoutError::Disconnected) => "event loop stopped".to_string(),
        };

        self.link = None;
        self.in_flight = 0;
        Err(TransportError::ConnectionLost(lost))
    }

    fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn is_open(&self) -> bool {
        self.link.is_some()
    }

    fn close(&mut self) {
        if let Some((client, mut connection)) = self.link.take() {
            if client.try_disconnect().is_ok()
                && Self::flush_disconnect(&mut connection, DISCONNECT_FLUSH)
            {
                debug!("[SESSION] MQTT DISCONNECT sent");
            } else {
                debug!("[SESSION] MQTT link dropped without DISCONNECT");
            }
        }
        self.in_flight = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrokerEndpoint, Credentials};

    #[test]
    fn test_closed_transport_rejects_io() {
        let mut transport = MqttTransport::new();
        assert!(!transport.is_open());
        assert_eq!(
            transport.publish("topic", b"00000", DeliveryLevel::AtLeastOnce),
            Err(TransportError::NotOpen)
        );
        assert_eq!(transport.poll(Duration::ZERO), Err(TransportError::NotOpen));
        transport.close();
    }

    /// Accept one client, acknowledge its CONNECT and collect every byte it
    /// sends afterwards until it hangs up.
    fn spawn_single_client_broker() -> (u16, std::thread::JoinHandle<Vec<u8>>) {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();

            // CONNECT is short enough for a one-byte remaining length
            let mut header = [0u8; 2];
            stream.read_exact(&mut header).unwrap();
            assert_eq!(header[0], 0x10);
            let mut body = vec![0u8; header[1] as usize];
            stream.read_exact(&mut body).unwrap();
            stream.write_all(&[0x20, 0x02, 0x00, 0x00]).unwrap();

            let mut after = Vec::new();
            let _ = stream.read_to_end(&mut after);
            after
        });
        (port, handle)
    }

    #[test]
    fn test_close_writes_disconnect_packet() {
        let (port, broker) = spawn_single_client_broker();
        let options = ConnectOptions::new(BrokerEndpoint::new("127.0.0.1", port))
            .with_connect_timeout(Duration::from_secs(5));

        let mut transport = MqttTransport::new();
        transport.open("closer", &options).unwrap();
        assert!(transport.is_open());
        transport.close();
        assert!(!transport.is_open());

        let received = broker.join().unwrap();
        assert!(
            received.windows(2).any(|w| w == [0xE0, 0x00]),
            "no DISCONNECT in {:02X?}",
            received
        );
    }

    #[test]
    fn test_options_carry_credentials_and_keepalive() {
        let options = ConnectOptions::new(BrokerEndpoint::new("broker.local", 1884))
            .with_credentials(Credentials::new("pi", Some("secret".into())))
            .with_keepalive_interval(Duration::from_secs(30));
        let mqtt = MqttTransport::mqtt_options("handsig", &options);
        assert_eq!(mqtt.client_id(), "handsig");
        assert_eq!(mqtt.broker_address(), ("broker.local".to_string(), 1884));
        assert_eq!(mqtt.keep_alive(), Duration::from_secs(30));
        assert_eq!(
            mqtt.credentials(),
            Some(("pi".to_string(), "secret".to_string()))
        );
    }
}
