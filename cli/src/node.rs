// UDP host — drives one decision engine from real timers and a broadcast socket
//
// Two tasks share the engine through a `SharedEngine` lock: the receive task
// feeds every datagram in as a hello, the timer task fires hello, harvest,
// route-eval and mobility ticks. The lock is never held across an await; hellos
// produced under the lock are queued and sent once it is released.

use crate::config::Config;
use crate::report::NodeSummary;
use anyhow::{Context, Result};
use dseran_core::{
    share, DecisionEngine, MobilityModel, NodeAddress, NodeEvent, SharedEngine, METRICS_TARGET,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Largest datagram we bother reading; hellos are 8 bytes
const RECV_BUFFER: usize = 64;

/// Milliseconds since the node started
fn now_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Best guess at the IP other nodes will see our hellos coming from.
///
/// Connecting a UDP socket sends nothing; it only asks the OS which
/// interface would be used.
async fn detect_local_ip(broadcast: IpAddr, port: u16) -> Option<IpAddr> {
    let probe = UdpSocket::bind("0.0.0.0:0").await.ok()?;
    probe.set_broadcast(true).ok()?;
    probe.connect(SocketAddr::new(broadcast, port)).await.ok()?;
    let ip = probe.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}

/// Every address our own broadcasts can arrive from.
///
/// The advertised address may be set by hand and differ from the one the
/// receiver derives from our IP, so both are listed.
fn own_addresses(advertised: NodeAddress, local_ip: Option<IpAddr>, bound: Option<IpAddr>) -> Vec<NodeAddress> {
    let mut own = vec![advertised];
    for ip in [local_ip, bound].into_iter().flatten() {
        if ip.is_unspecified() {
            continue;
        }
        let address = NodeAddress::from_ip(&ip);
        if !own.contains(&address) {
            own.push(address);
        }
    }
    own
}

async fn receive_loop(
    socket: Arc<UdpSocket>,
    engine: SharedEngine,
    own: Vec<NodeAddress>,
    started: Instant,
) -> Result<()> {
    let mut buf = [0u8; RECV_BUFFER];

    loop {
        let (len, src) = socket
            .recv_from(&mut buf)
            .await
            .context("Failed to receive hello")?;

        let sender = NodeAddress::from_ip(&src.ip());
        if own.contains(&sender) {
            // Our own broadcast looping back
            continue;
        }

        let mut node = engine.lock();
        if node.is_exhausted() {
            return Ok(());
        }
        let outcome = node.on_hello_received(&buf[..len], sender, now_ms(started));
        debug!("Hello from {} ({} bytes): {:?}", src, len, outcome);
    }
}

/// Run the node until it runs out of energy or Ctrl+C is pressed
pub async fn run(config: &Config, address: Option<NodeAddress>, port: Option<u16>) -> Result<NodeSummary> {
    let port = port.unwrap_or(config.network.port);
    let bind = SocketAddr::new(config.network.bind_address, port);
    let broadcast = SocketAddr::new(config.network.broadcast_address, port);

    let socket = UdpSocket::bind(bind)
        .await
        .with_context(|| format!("Failed to bind UDP socket on {}", bind))?;
    socket
        .set_broadcast(true)
        .context("Failed to enable broadcast")?;
    let socket = Arc::new(socket);

    let local_ip = detect_local_ip(broadcast.ip(), port).await;
    let address = match address {
        Some(address) => address,
        None => {
            let ip = local_ip.context("Could not detect a local IP; pass --address")?;
            NodeAddress::from_ip(&ip)
        }
    };
    let bound_ip = socket.local_addr().ok().map(|addr| addr.ip());
    let own = own_addresses(address, local_ip, bound_ip);
    debug!("Ignoring hellos from own addresses {:?}", own);

    let engine_config = config.engine.clone();
    let hello_every = Duration::from_millis(engine_config.hello_interval_ms);
    let harvest_every = Duration::from_millis(engine_config.harvest_interval_ms);
    let route_eval_every = Duration::from_millis(engine_config.route_eval_interval_ms);
    let move_every = Duration::from_millis(config.mobility.step_interval_ms);

    let engine = share(DecisionEngine::new(address, engine_config).context("Invalid engine config")?);
    let started = Instant::now();

    info!("Node {} listening on {}, broadcasting to {}", address, bind, broadcast);

    let receiver = {
        let socket = socket.clone();
        let engine = engine.clone();
        tokio::spawn(async move {
            if let Err(e) = receive_loop(socket, engine, own, started).await {
                warn!("Receive loop stopped: {:#}", e);
            }
        })
    };

    let mut rng = StdRng::from_entropy();
    let mut mobility = MobilityModel::random(&config.mobility, &mut rng);

    // Hello fires immediately; the rest wait one full period
    let mut hello = interval(hello_every);
    let mut harvest = interval_at(started + harvest_every, harvest_every);
    let mut route_eval = interval_at(started + route_eval_every, route_eval_every);
    let mut movement = interval_at(started + move_every, move_every);
    for timer in [&mut hello, &mut harvest, &mut route_eval, &mut movement] {
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let event = tokio::select! {
            _ = hello.tick() => NodeEvent::HelloTick,
            _ = harvest.tick() => NodeEvent::HarvestTick,
            _ = route_eval.tick() => NodeEvent::RouteEvalTick,
            _ = movement.tick() => {
                mobility.step(&mut rng);
                let position = mobility.position();
                info!(target: METRICS_TARGET, node = %address, x = position.x, y = position.y, "MOVE");
                NodeEvent::MovementNotified
            }
            _ = &mut shutdown => {
                info!("Shutting down node {}", address);
                break;
            }
        };

        let mut outbox: Vec<Vec<u8>> = Vec::new();
        let exhausted = {
            let mut engine = engine.lock();
            engine.handle(event, now_ms(started), &mut outbox);
            engine.is_exhausted()
        };

        for payload in outbox {
            if let Err(e) = socket.send_to(&payload, broadcast).await {
                warn!("Failed to broadcast hello to {}: {}", broadcast, e);
            }
        }

        if exhausted {
            break;
        }
    }

    receiver.abort();

    let summary = NodeSummary::from_engine(&engine.lock(), now_ms(started));
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dseran_core::hello::encode_hello;
    use dseran_core::DseranConfig;

    #[tokio::test]
    async fn test_receive_loop_feeds_engine_and_skips_self() {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let target = socket.local_addr().unwrap();

        // Loopback traffic maps to address 00:01 (127.0.0.1 -> [0, 1])
        let own = NodeAddress::new([0, 1]);
        let engine = share(DecisionEngine::new(NodeAddress::new([9, 9]), DseranConfig::default()).unwrap());

        let task = tokio::spawn(receive_loop(socket, engine.clone(), vec![own], Instant::now()));

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(&encode_hello(80, 1.0, 0), target).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Sender matched our own address: nothing recorded
        assert!(engine.lock().neighbors().is_empty());
        task.abort();

        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let target = socket.local_addr().unwrap();
        let task = tokio::spawn(receive_loop(socket, engine.clone(), vec![NodeAddress::new([9, 9])], Instant::now()));

        sender.send_to(&encode_hello(80, 1.0, 0), target).await.unwrap();
        sender.send_to(&[1, 2, 3], target).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        {
            let engine = engine.lock();
            assert_eq!(engine.neighbors().len(), 1);
            assert!(engine.neighbors().contains(&NodeAddress::new([0, 1])));
            assert_eq!(engine.stats().hellos_malformed, 1);
        }
        task.abort();
    }

    #[test]
    fn test_own_addresses_include_ip_derived_address() {
        let advertised = NodeAddress::new([9, 9]);
        let loopback: IpAddr = "127.0.0.1".parse().unwrap();
        let any: IpAddr = "0.0.0.0".parse().unwrap();

        assert_eq!(
            own_addresses(advertised, Some(loopback), Some(loopback)),
            vec![advertised, NodeAddress::new([0, 1])]
        );
        assert_eq!(own_addresses(advertised, None, Some(any)), vec![advertised]);
    }

    #[tokio::test]
    async fn test_manual_address_still_ignores_own_broadcast() {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let bound = socket.local_addr().unwrap();

        // Advertised address set by hand, unrelated to the socket's IP
        let advertised = NodeAddress::new([9, 9]);
        let engine = share(DecisionEngine::new(advertised, DseranConfig::default()).unwrap());
        let local_ip = detect_local_ip(bound.ip(), bound.port()).await;
        let own = own_addresses(advertised, local_ip, Some(bound.ip()));

        let task = tokio::spawn(receive_loop(socket.clone(), engine.clone(), own, Instant::now()));

        // The node's own hello loops back through its own socket
        let mut outbox: Vec<Vec<u8>> = Vec::new();
        engine.lock().on_tick_hello(0, &mut outbox);
        for payload in &outbox {
            socket.send_to(payload, bound).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        {
            let mut engine = engine.lock();
            engine.on_tick_route_eval();
            assert!(engine.neighbors().is_empty());
            assert_eq!(engine.next_hop(), None);
        }
        task.abort();
    }
}
