// Integration tests for the D-SERAN decision engine
//
// Several independent nodes in one process, wired together by hand: hellos
// broadcast by one engine are delivered to the others as HelloReceived events.

use dseran_core::hello::encode_hello;
use dseran_core::*;

fn addr(n: u8) -> NodeAddress {
    NodeAddress::new([0, n])
}

fn node(n: u8, config: DseranConfig) -> DecisionEngine {
    DecisionEngine::new(
        addr(n),
        DseranConfig {
            nonce_seed: Some(u64::from(n)),
            ..config
        },
    )
    .unwrap()
}

/// Let `from` send one hello and deliver it to every engine in `to`
fn exchange(from: &mut DecisionEngine, to: &mut [&mut DecisionEngine], now: u64) {
    let mut outbox: Vec<Vec<u8>> = Vec::new();
    from.handle(NodeEvent::HelloTick, now, &mut outbox);

    for payload in outbox {
        for receiver in to.iter_mut() {
            let mut unused: Vec<Vec<u8>> = Vec::new();
            receiver.handle(
                NodeEvent::HelloReceived {
                    payload: payload.clone(),
                    sender: from.address(),
                },
                now,
                &mut unused,
            );
        }
    }
}

#[test]
fn test_literal_selection_case() {
    // Neighbors A (trust 0.9, energy 50) and B (trust 0.6, energy 80):
    // B scores 48 against A's 45 and must win.
    let mut table = NeighborTable::new(16);
    table.upsert(addr(0xA), 50, 0.9, 0);
    table.upsert(addr(0xB), 80, 0.6, 0);

    let thresholds = DseranConfig::default().thresholds();
    assert_eq!(routing::select(&table, &thresholds), Some(addr(0xB)));
    // Idempotent with no intervening mutation
    assert_eq!(routing::select(&table, &thresholds), Some(addr(0xB)));

    println!("✓ Trust × energy scoring picks B over A");
}

#[test]
fn test_low_energy_neighbor_never_selected() {
    let mut engine = node(1, DseranConfig::default());

    engine.on_hello_received(&encode_hello(5, 0.5, 0), addr(2), 0);
    let trust = engine.neighbors().get(&addr(2)).unwrap().trust();
    assert!(trust > 0.5);

    engine.on_tick_route_eval();
    assert_eq!(engine.next_hop(), None);

    println!("✓ Energy threshold gates selection");
}

#[test]
fn test_three_node_neighborhood() {
    let mut a = node(1, DseranConfig::default());
    let mut b = node(2, DseranConfig::default());
    let mut c = node(3, DseranConfig::default());

    // C has spent some energy before joining
    let mut drain: Vec<Vec<u8>> = Vec::new();
    for t in 0..30 {
        c.on_tick_hello(t, &mut drain);
    }

    exchange(&mut b, &mut [&mut a, &mut c], 100);
    exchange(&mut c, &mut [&mut a, &mut b], 200);
    exchange(&mut a, &mut [&mut b, &mut c], 300);

    assert_eq!(a.neighbors().len(), 2);
    assert_eq!(b.neighbors().len(), 2);
    assert_eq!(c.neighbors().len(), 2);

    for engine in [&mut a, &mut b, &mut c] {
        engine.on_movement_notified();
    }

    // B advertised 100, C advertised 70: A forwards through B
    assert_eq!(a.next_hop(), Some(addr(2)));
    // A and B both advertised 100 to C; B was heard first and wins the tie
    assert_eq!(c.next_hop(), Some(addr(2)));
    // B sees A (100) and C (70)
    assert_eq!(b.next_hop(), Some(addr(1)));

    println!("✓ Three nodes discover each other and pick the most energetic neighbor");
}

#[test]
fn test_route_heals_when_next_hop_drains() {
    let mut engine = node(1, DseranConfig::default());

    engine.on_hello_received(&encode_hello(90, 1.0, 0), addr(2), 0);
    engine.on_hello_received(&encode_hello(60, 1.0, 0), addr(3), 0);
    engine.on_tick_route_eval();
    assert_eq!(engine.next_hop(), Some(addr(2)));

    // Node 2 reports it is nearly dead
    engine.on_hello_received(&encode_hello(8, 1.0, 0), addr(2), 10_000);
    let outcome = engine.on_tick_route_eval();
    assert_eq!(
        outcome,
        EventOutcome::RouteEvaluated {
            next_hop: Some(addr(3)),
            changed: true
        }
    );

    // Node 3 drains too: no route at all
    engine.on_hello_received(&encode_hello(3, 1.0, 0), addr(3), 20_000);
    engine.on_movement_notified();
    assert_eq!(engine.next_hop(), None);

    // Node 2 recovers by harvesting
    engine.on_hello_received(&encode_hello(40, 1.0, 0), addr(2), 30_000);
    engine.on_movement_notified();
    assert_eq!(engine.next_hop(), Some(addr(2)));
    assert_eq!(engine.stats().route_changes, 4);

    println!("✓ Next hop self-heals as neighbor energy changes");
}

#[test]
fn test_energy_floor_and_lifetime() {
    let config = DseranConfig {
        initial_energy: 1,
        ..Default::default()
    };
    let mut engine = node(1, config);
    let mut sent: Vec<Vec<u8>> = Vec::new();

    assert_eq!(engine.handle(NodeEvent::HelloTick, 5_000, &mut sent), EventOutcome::EnergyExhausted);
    assert_eq!(engine.energy().residual(), 0);
    assert_eq!(engine.state(), EngineState::Exhausted);

    for event in [
        NodeEvent::HelloTick,
        NodeEvent::HarvestTick,
        NodeEvent::RouteEvalTick,
        NodeEvent::MovementNotified,
    ] {
        assert_eq!(engine.handle(event, 6_000, &mut sent), EventOutcome::Ignored);
    }

    assert_eq!(engine.energy().residual(), 0);
    assert_eq!(sent.len(), 1);
    assert_eq!(engine.stats().lifetime_end, Some(5_000));

    println!("✓ Exhausted node stops participating");
}

#[test]
fn test_full_battery_lifetime_with_harvesting() {
    // One hello every 10 s costs 1, one harvest every 5 s refunds 2:
    // the node never dies when harvesting keeps pace.
    let mut engine = node(1, DseranConfig::default());
    let mut sent: Vec<Vec<u8>> = Vec::new();

    for tick in 0..1_000u64 {
        let now = tick * 5_000;
        if tick % 2 == 0 {
            engine.handle(NodeEvent::HelloTick, now, &mut sent);
        }
        engine.handle(NodeEvent::HarvestTick, now, &mut sent);
    }

    assert_eq!(engine.state(), EngineState::Active);
    assert_eq!(engine.energy().residual(), 100);
    assert_eq!(engine.energy().harvested_total(), 2_000);
    assert_eq!(engine.stats().hellos_sent, 500);

    // Without harvesting, 100 hellos drain it
    let mut engine = node(2, DseranConfig::default());
    let mut sent: Vec<Vec<u8>> = Vec::new();
    for tick in 0..100u64 {
        engine.handle(NodeEvent::HelloTick, tick * 10_000, &mut sent);
    }
    assert_eq!(engine.state(), EngineState::Exhausted);
    assert_eq!(engine.stats().lifetime_end, Some(990_000));

    println!("✓ Harvesting extends node lifetime");
}

#[test]
fn test_capacity_rejects_extra_neighbors() {
    let mut engine = node(0xFF, DseranConfig::default());

    for n in 0..16u8 {
        let outcome = engine.on_hello_received(&encode_hello(50, 1.0, 0), addr(n), 0);
        assert!(matches!(
            outcome,
            EventOutcome::HelloProcessed {
                upsert: UpsertOutcome::Inserted,
                ..
            }
        ));
    }

    let outcome = engine.on_hello_received(&encode_hello(100, 1.0, 0), addr(16), 0);
    assert!(matches!(
        outcome,
        EventOutcome::HelloProcessed {
            upsert: UpsertOutcome::Rejected(RejectReason::TableFull),
            ..
        }
    ));
    assert_eq!(engine.neighbors().len(), 16);
    assert!(!engine.neighbors().contains(&addr(16)));

    // The rejected neighbor had the best score but is unknown to the selector
    engine.on_tick_route_eval();
    assert_eq!(engine.next_hop(), Some(addr(0)));

    println!("✓ Full table turns new neighbors away without eviction");
}

#[test]
fn test_shared_engine_across_threads() {
    let shared = share(node(1, DseranConfig::default()));

    let handles: Vec<_> = (2..6u8)
        .map(|n| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                let mut engine = shared.lock();
                engine.on_hello_received(&encode_hello(20 + u16::from(n), 1.0, 0), addr(n), 0);
                engine.on_tick_route_eval();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let engine = shared.lock();
    assert_eq!(engine.neighbors().len(), 4);
    assert_eq!(engine.next_hop(), Some(addr(5)));
}

#[test]
fn test_config_json_roundtrip() {
    let config = DseranConfig {
        max_neighbors: 8,
        trust_source: TrustSource::Local,
        nonce_seed: Some(3),
        ..Default::default()
    };

    let json = serde_json::to_string(&config).unwrap();
    let restored: DseranConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, config);
}
