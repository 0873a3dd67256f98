/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! End-to-end behaviour of points, tasks and devices driven by the cycle
//! scheduler over the simulated transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use pollio::connection::DeviceConnection;
use pollio::device::Device;
use pollio::error::{PointError, Quality};
use pollio::event::EventKind;
use pollio::point::{AttributeId, AttributeValue, Input, IoPoint, Output};
use pollio::scheduler::CycleScheduler;
use pollio::sim::{Register, SimulatedLink};
use pollio::task::Task;

fn at(ms: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_millis(ms)
}

struct Rig {
    link: Arc<SimulatedLink>,
    device: Arc<Device>,
    temp_reg: Arc<Register<f64>>,
    temp: Arc<Input<f64>>,
    valve_reg: Arc<Register<f64>>,
    valve: Arc<Output<f64>>,
    scheduler: CycleScheduler,
}

fn rig() -> Rig {
    let link = Arc::new(SimulatedLink::new());
    let device = Device::new("plc", link.clone());
    let connection: Arc<dyn DeviceConnection> = device.clone();

    let temp_reg = Arc::new(Register::new(21.0));
    let temp = Input::<f64>::new("temp", connection.clone(), temp_reg.clone());
    let valve_reg = Arc::new(Register::new(0.0));
    let valve = Output::<f64>::new("valve", connection, valve_reg.clone());

    let mut scheduler = CycleScheduler::new();
    scheduler
        .add_task("plc.reconnect", Box::new(device.reconnect_task()))
        .unwrap();
    for task in [temp.read_task(), valve.read_task(), valve.write_task()] {
        scheduler.add_task(task.label(), Box::new(task)).unwrap();
    }

    Rig {
        link,
        device,
        temp_reg,
        temp,
        valve_reg,
        valve,
        scheduler,
    }
}

#[test]
fn initial_read_then_failing_read() {
    let mut rig = rig();
    rig.scheduler.start(at(0)).unwrap();

    let snap = rig.temp.snapshot();
    assert_eq!(snap.error, None);
    assert_eq!(snap.quality, Quality::Good);
    assert_eq!(snap.value, 21.0);
    assert_eq!(rig.valve.resolve_event("writeError").unwrap().fire_count(), 0);

    rig.temp_reg.fail_next_read(PointError::DeviceFault { code: 9 });
    rig.scheduler.run_cycle(at(10)).unwrap();

    let snap = rig.temp.snapshot();
    assert_eq!(snap.error, Some(PointError::DeviceFault { code: 9 }));
    assert_eq!(snap.quality, Quality::Bad);
    assert_eq!(rig.temp.resolve_event("error").unwrap().fire_count(), 1);
    assert!(rig.device.connected(), "an operation fault keeps the link up");
}

#[test]
fn pending_write_is_dropped_while_disconnected() {
    let mut rig = rig();
    rig.link.set_available(false);
    rig.scheduler.start(at(0)).unwrap();
    assert!(!rig.device.connected());

    // The link is still down, so the reconnect task fails this cycle too.
    rig.valve.write(5.0);
    rig.scheduler.run_cycle(at(10)).unwrap();

    let write = rig.valve.write_snapshot();
    assert_eq!(write.write_time, None);
    assert_eq!(rig.valve.resolve_event("written").unwrap().fire_count(), 0);
    assert_eq!(rig.valve.resolve_event("writeError").unwrap().fire_count(), 0);
    assert!(!rig.valve.has_pending_write());
    assert_eq!(rig.valve_reg.write_count(), 0);

    rig.link.set_available(true);
    rig.scheduler.run_cycle(at(20)).unwrap();
    assert!(rig.device.connected());
    assert_eq!(rig.valve_reg.write_count(), 0, "dropped value is not retried");
}

#[test]
fn pending_write_reaches_the_device() {
    let mut rig = rig();
    rig.scheduler.start(at(0)).unwrap();

    rig.valve.write(1.0);
    rig.valve.write(2.0);
    rig.scheduler.run_cycle(at(10)).unwrap();

    assert_eq!(rig.valve_reg.get(), 2.0, "last write wins");
    assert_eq!(rig.valve_reg.write_count(), 1);
    assert_eq!(rig.valve.write_snapshot().write_time, Some(at(10)));
    assert_eq!(rig.valve.resolve_event("written").unwrap().fire_count(), 1);

    rig.scheduler.run_cycle(at(20)).unwrap();
    assert_eq!(rig.valve.value(), 2.0, "read task picks up the written value");
}

#[test]
fn shutdown_disconnects_once_after_many_cycles() {
    let mut rig = rig();
    rig.scheduler.start(at(0)).unwrap();
    for cycle in 1..=25 {
        rig.scheduler.run_cycle(at(cycle * 10)).unwrap();
    }
    assert_eq!(rig.device.connect_requests(), 3);

    rig.scheduler.shutdown(at(300)).unwrap();
    assert_eq!(rig.device.connect_requests(), 0);
    assert!(!rig.device.connected());
    assert_eq!(rig.link.close_count(), 1);
    assert_eq!(rig.temp.snapshot().error, Some(PointError::NotConnected));
    assert!(rig.scheduler.shutdown(at(310)).is_err());
}

#[test]
fn connection_loss_is_mirrored_and_recovered() {
    let mut rig = rig();
    rig.scheduler.start(at(0)).unwrap();

    rig.temp_reg.fail_next_read(PointError::ConnectionLost);
    rig.scheduler.run_cycle(at(10)).unwrap();

    assert!(!rig.device.connected());
    let points: [&dyn IoPoint; 2] = [&*rig.temp, &*rig.valve];
    for point in points {
        assert!(point.resolve_event("qualityChanged").unwrap().fire_count() >= 2);
    }
    assert_eq!(rig.valve.snapshot().error, Some(PointError::ConnectionLost));
    assert_eq!(rig.valve.snapshot().quality, Quality::Bad);
    assert_eq!(rig.valve.write_snapshot().write_error, None);

    // The link comes back before any fresh read: the stale value stays bad.
    rig.temp_reg.set(50.0);
    rig.device.maintain(at(15));
    assert!(rig.device.connected());
    let snap = rig.temp.snapshot();
    assert_eq!(snap.value, 21.0);
    assert_eq!(snap.error, Some(PointError::NoData));
    assert_eq!(snap.quality, Quality::Bad);

    // Next cycle: the reads succeed.
    rig.scheduler.run_cycle(at(20)).unwrap();
    assert!(rig.device.connected());
    assert_eq!(rig.link.open_count(), 2);
    assert_eq!(rig.temp.snapshot().error, None);
    assert_eq!(rig.temp.snapshot().quality, Quality::Good);
    assert_eq!(rig.temp.snapshot().value, 50.0);
}

#[test]
fn connecting_one_point_leaves_unread_neighbours_without_data() {
    let rig = rig();
    let connection: Arc<dyn DeviceConnection> = rig.device.clone();
    let level = Input::<f64>::new("level", connection, Arc::new(Register::new(3.0)));

    rig.temp
        .read_task()
        .prepare_pre_operational(&pollio::task::ExecutionContext::new(at(0), 0));
    assert!(rig.device.connected());
    assert_eq!(rig.temp.snapshot().quality, Quality::Good);

    let points: [&dyn IoPoint; 2] = [&*level, &*rig.valve];
    for point in points {
        assert_eq!(
            point.read_attribute(AttributeId::Error),
            Ok(AttributeValue::ErrorCode(PointError::NoData.code()))
        );
        assert_eq!(
            point.read_attribute(AttributeId::Quality),
            Ok(AttributeValue::Quality(Quality::Bad))
        );
        assert_eq!(point.resolve_event("error").unwrap().fire_count(), 0);
    }
    assert_eq!(level.snapshot().change_time, None);

    level
        .read_task()
        .prepare_pre_operational(&pollio::task::ExecutionContext::new(at(5), 0));
    assert_eq!(level.snapshot().error, None);
    assert_eq!(level.snapshot().value, 3.0);
}

#[test]
fn change_time_follows_value_changes_only() {
    let mut rig = rig();
    rig.scheduler.start(at(0)).unwrap();
    let first_change = rig.temp.snapshot().change_time;

    rig.scheduler.run_cycle(at(10)).unwrap();
    let snap = rig.temp.snapshot();
    assert_eq!(snap.update_time, Some(at(10)));
    assert_eq!(snap.change_time, first_change);

    rig.temp_reg.set(22.5);
    rig.scheduler.run_cycle(at(20)).unwrap();
    assert_eq!(rig.temp.snapshot().change_time, Some(at(20)));
}

#[test]
fn subscribers_receive_change_notices() {
    let mut rig = rig();
    let mut rx = rig.temp.resolve_event("valueChanged").unwrap().subscribe();
    rig.scheduler.start(at(0)).unwrap();

    let notice = rx.try_recv().unwrap();
    assert_eq!(notice.kind, EventKind::ValueChanged);
    assert_eq!(notice.timestamp, at(0));

    rig.scheduler.run_cycle(at(10)).unwrap();
    assert!(rx.try_recv().is_err(), "same value, no notice");
}

#[test]
fn readers_and_writers_run_alongside_the_scheduler() {
    let mut rig = rig();
    rig.scheduler.start(at(0)).unwrap();
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                while !done.load(Ordering::Relaxed) {
                    let snap = rig.temp.snapshot();
                    // The register is set to the cycle number before each
                    // cycle; value and update time come from the same publish.
                    if let (Some(t), v) = (snap.update_time, snap.value) {
                        let ms = t.duration_since(SystemTime::UNIX_EPOCH).unwrap().as_millis();
                        if ms > 0 {
                            assert_eq!(v as u128 * 10, ms, "torn snapshot");
                        }
                    }
                }
            });
        }
        s.spawn(|| {
            for i in 0..2_000 {
                rig.valve.write(i as f64);
            }
        });

        for cycle in 1..=500u64 {
            rig.temp_reg.set(cycle as f64);
            rig.scheduler.run_cycle(at(cycle * 10)).unwrap();
        }
        done.store(true, Ordering::Relaxed);
    });

    // Anything still pending is the last value written.
    rig.scheduler.run_cycle(at(10_000)).unwrap();
    assert_eq!(rig.valve_reg.get(), 1_999.0);
}

#[test]
fn dropped_point_stops_its_tasks() {
    let mut rig = rig();
    rig.scheduler.start(at(0)).unwrap();
    let handle = rig.temp.read_task();
    drop(rig.temp);

    assert!(!handle.is_alive());
    handle.operational(&pollio::task::ExecutionContext::new(at(10), 1));
    rig.scheduler.run_cycle(at(10)).unwrap();
    assert_eq!(rig.device.error_sink_count(), 1, "only the valve is left");
}
