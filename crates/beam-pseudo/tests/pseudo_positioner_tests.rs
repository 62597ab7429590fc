//! 伪定位器集成测试
//!
//! 使用仿真电机和仿真 notepad 信号，覆盖三种变换的构造、运动、限位和错误映射。

use beam_pseudo::{
    CombineMode, DelayStage, LookupTable, PseudoAxisSpec, PseudoError, PseudoPosition,
    PseudoPositionerBuilder, SyncAxes, Table,
};
use beam_signal::{MoveStatus, Positioner, SignalError, SimHardware, SimMotor};
use beam_units::Unit;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

fn motor(name: &str, egu: &str, position: f64) -> Arc<SimMotor> {
    Arc::new(SimMotor::new(name, egu).with_position(position))
}

fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// 永远拒绝发出运动的真实轴
struct Rejecting;

impl Positioner for Rejecting {
    fn name(&self) -> &str {
        "REJECT"
    }

    fn position(&self) -> Result<f64, SignalError> {
        Ok(0.0)
    }

    fn move_to(&self, _target: f64) -> Result<MoveStatus, SignalError> {
        Err(SignalError::io("REJECT", "controller offline"))
    }

    fn egu(&self) -> String {
        "mm".to_string()
    }
}

fn lookup_table() -> Table {
    Table::from_rows(&[
        [0.0, 0.0],
        [1.0, 10.0],
        [2.0, 20.0],
        [3.0, 30.0],
    ])
    .unwrap()
}

// ==================== SyncAxes ====================

#[test]
fn test_sync_offsets_and_move() {
    let left = motor("XPP:MTR:01", "mm", 1.0);
    let right = motor("XPP:MTR:02", "mm", 4.0);
    let sync = PseudoPositionerBuilder::new("parallel", SyncAxes::new())
        .prefix("XPP:SYNC")
        .real_axis("left", left.clone())
        .real_axis("right", right.clone())
        .build()
        .unwrap();

    assert_eq!(sync.pseudo_names().as_slice(), &["pseudo".to_string()]);
    assert_eq!(sync.axes().pseudo("pseudo").unwrap().prefix().as_str(), "XPP:SYNC:pseudo");
    assert!(sync.offsets().is_none());
    assert_eq!(sync.wm().unwrap().value("pseudo").unwrap(), 1.0);

    let pos = sync.mv(&[2.0], None).unwrap();
    assert_eq!(pos.value("pseudo").unwrap(), 2.0);
    assert_eq!(left.position().unwrap(), 2.0);
    assert_eq!(right.position().unwrap(), 5.0);

    // 偏移在第一次运动前自动保存
    let offsets = sync.offsets().unwrap();
    assert_eq!(offsets["left"], 0.0);
    assert_eq!(offsets["right"], 3.0);
}

#[test]
fn test_sync_save_offsets_rebases() {
    let left = motor("L", "mm", 0.0);
    let right = motor("R", "mm", 1.0);
    let sync = PseudoPositionerBuilder::new("parallel", SyncAxes::new())
        .real_axis("left", left.clone())
        .real_axis("right", right.clone())
        .build()
        .unwrap();

    sync.save_offsets().unwrap();
    right.set_position(10.0);

    // 未重新保存时沿用旧偏移
    let real = sync.forward(&sync.make_position([1.0]).unwrap()).unwrap();
    assert_eq!(real.values(), &[1.0, 2.0]);

    let offsets = sync.save_offsets().unwrap();
    assert_eq!(offsets["right"], 10.0);
    let real = sync.forward(&sync.make_position([1.0]).unwrap()).unwrap();
    assert_eq!(real.values(), &[1.0, 11.0]);
}

#[test]
fn test_sync_mean_mode() {
    let a = motor("A", "mm", 0.0);
    let b = motor("B", "mm", 2.0);
    let sync = PseudoPositionerBuilder::new("mean", SyncAxes::with_mode(CombineMode::Mean))
        .real_axis("a", a.clone())
        .real_axis("b", b.clone())
        .build()
        .unwrap();

    assert_eq!(sync.wm().unwrap().value("pseudo").unwrap(), 1.0);
    sync.mvr(&[1.0], None).unwrap();
    assert_eq!(a.position().unwrap(), 1.0);
    assert_eq!(b.position().unwrap(), 3.0);
}

#[test]
fn test_sync_requires_real_axes() {
    let err = PseudoPositionerBuilder::new("bare", SyncAxes::new())
        .build()
        .err()
        .unwrap();
    assert!(err.is_abstract_usage(), "{}", err);
}

// ==================== DelayStage ====================

#[test]
fn test_delay_numeric() {
    let mtr = motor("LAS:MMS:01", "mm", 0.0);
    let stage = PseudoPositionerBuilder::new("delay", DelayStage::default())
        .prefix("LAS:DLY")
        .real_axis("motor", mtr.clone())
        .build()
        .unwrap();

    let real = stage.forward(&stage.make_position([1e-9]).unwrap()).unwrap();
    let mm = real.value("motor").unwrap();
    assert!((mm - 149.896).abs() < 1e-3, "got {}", mm);

    let back = stage.inverse(&real).unwrap();
    assert!((back.value("delay").unwrap() - 1e-9).abs() < 1e-20);

    stage.mv(&[1e-9], None).unwrap();
    assert!((mtr.position().unwrap() - 149.896229).abs() < 1e-6);
    assert_eq!(stage.axes().pseudo("delay").unwrap().egu(), "s");
}

#[test]
fn test_delay_units() {
    let mtr = motor("LAS:MMS:02", "um", 0.0);
    let stage = PseudoPositionerBuilder::new(
        "delay_ps",
        DelayStage::new(Unit::Picosecond, 4).unwrap(),
    )
    .real_axis("motor", mtr.clone())
    .build()
    .unwrap();

    // 1 ps, 4 次往返: 299.792458 um / 4
    let real = stage.forward(&stage.make_position([1.0]).unwrap()).unwrap();
    assert!((real.value("motor").unwrap() - 74.9481145).abs() < 1e-6);
    assert_eq!(stage.transform().motor_unit(), Some(Unit::Micrometer));
}

#[test]
fn test_delay_requires_motor_axis() {
    let err = PseudoPositionerBuilder::new("delay", DelayStage::default())
        .real_axis("stage", motor("M", "mm", 0.0))
        .build()
        .err()
        .unwrap();
    assert!(err.is_abstract_usage(), "{}", err);

    let err = PseudoPositionerBuilder::new("delay", DelayStage::default())
        .build()
        .err()
        .unwrap();
    assert!(err.is_abstract_usage(), "{}", err);
}

#[test]
fn test_delay_rejects_time_motor() {
    let err = PseudoPositionerBuilder::new("delay", DelayStage::default())
        .real_axis("motor", motor("M", "ns", 0.0))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, PseudoError::Unit(_)), "{}", err);
}

#[test]
fn test_delay_pseudo_egu_must_match() {
    let err = PseudoPositionerBuilder::new("delay", DelayStage::default())
        .pseudo_axis(PseudoAxisSpec::new("delay").with_egu("ps"))
        .real_axis("motor", motor("M", "mm", 0.0))
        .build()
        .err()
        .unwrap();
    assert!(
        matches!(err, PseudoError::InvalidParameter { param: "egu", .. }),
        "{}",
        err
    );

    for egu in ["s", ""] {
        let stage = PseudoPositionerBuilder::new("delay", DelayStage::default())
            .pseudo_axis(PseudoAxisSpec::new("delay").with_egu(egu))
            .real_axis("motor", motor("M", "mm", 0.0))
            .build()
            .unwrap();
        assert_eq!(stage.transform().egu(), Unit::Second);
    }
}

// ==================== LookupTable ====================

fn lookup_positioner(
    mtr: Arc<SimMotor>,
) -> beam_pseudo::PseudoPositioner<LookupTable> {
    PseudoPositionerBuilder::new("lut", LookupTable::new(lookup_table(), ["mtr", "pseudo"]))
        .pseudo_axis(PseudoAxisSpec::new("pseudo"))
        .real_axis("mtr", mtr)
        .build()
        .unwrap()
}

#[test]
fn test_lookup_interpolation() {
    let lut = lookup_positioner(motor("MTR", "mm", 0.0));
    let forward = |p: f64| {
        lut.forward(&lut.make_position([p]).unwrap())
            .unwrap()
            .value("mtr")
            .unwrap()
    };
    assert_eq!(forward(15.0), 1.5);
    assert_eq!(forward(-5.0), 0.0);
    assert_eq!(forward(35.0), 3.0);

    let real = beam_pseudo::RealPosition::new(lut.real_names(), [2.5]).unwrap();
    assert_eq!(lut.inverse(&real).unwrap().value("pseudo").unwrap(), 25.0);
}

#[test]
fn test_lookup_sets_limits() {
    let mtr = motor("MTR", "mm", 0.0);
    let lut = lookup_positioner(mtr.clone());
    assert_eq!(lut.axes().pseudo("pseudo").unwrap().limits(), (0.0, 30.0));
    assert_eq!(mtr.limits(), (0.0, 3.0));

    // 超出伪轴限位的运动在发出前被拒绝
    let err = lut.mv(&[40.0], None).unwrap_err();
    assert!(matches!(err, PseudoError::LimitExceeded { .. }), "{}", err);
    assert!(mtr.move_history().is_empty());

    let pos = lut.mv(&[25.0], None).unwrap();
    assert_eq!(mtr.position().unwrap(), 2.5);
    assert_eq!(pos.value("pseudo").unwrap(), 25.0);
}

#[test]
fn test_lookup_limit_failure_is_swallowed() {
    let mtr = motor("MTR", "mm", 0.0);
    mtr.reject_limits(true);
    let lut = lookup_positioner(mtr.clone());
    assert_eq!(mtr.limits(), (0.0, 0.0));
    assert_eq!(lut.axes().pseudo("pseudo").unwrap().limits(), (0.0, 30.0));
}

#[test]
fn test_lookup_missing_column_names_axis() {
    let err = PseudoPositionerBuilder::new(
        "lut",
        LookupTable::new(lookup_table(), ["other", "pseudo"]),
    )
    .pseudo_axis(PseudoAxisSpec::new("pseudo"))
    .real_axis("mtr", motor("MTR", "mm", 0.0))
    .build()
    .err()
    .unwrap();

    assert_eq!(
        err,
        PseudoError::MissingColumns {
            axes: vec!["mtr".to_string()]
        }
    );
    assert!(err.to_string().contains("mtr"));
}

#[test]
fn test_lookup_column_count_mismatch() {
    let err = PseudoPositionerBuilder::new(
        "lut",
        LookupTable::new(lookup_table(), ["mtr", "pseudo", "extra"]),
    )
    .pseudo_axis(PseudoAxisSpec::new("pseudo"))
    .real_axis("mtr", motor("MTR", "mm", 0.0))
    .build()
    .err()
    .unwrap();
    assert_eq!(
        err,
        PseudoError::ColumnCountMismatch {
            names: 3,
            columns: 2
        }
    );
}

#[test]
fn test_lookup_non_monotonic() {
    let table = Table::from_rows(&[[0.0, 0.0], [2.0, 10.0], [1.0, 20.0]]).unwrap();
    let err = PseudoPositionerBuilder::new("lut", LookupTable::new(table, ["mtr", "pseudo"]))
        .pseudo_axis(PseudoAxisSpec::new("pseudo"))
        .real_axis("mtr", motor("MTR", "mm", 0.0))
        .build()
        .err()
        .unwrap();
    assert_eq!(
        err,
        PseudoError::NonMonotonic {
            column: "mtr".to_string()
        }
    );
}

#[test]
fn test_lookup_descending_table() {
    let table = Table::from_rows(&[[3.0, 0.0], [2.0, 10.0], [1.0, 20.0], [0.0, 30.0]]).unwrap();
    let lut = PseudoPositionerBuilder::new("lut", LookupTable::new(table, ["mtr", "pseudo"]))
        .pseudo_axis(PseudoAxisSpec::new("pseudo"))
        .real_axis("mtr", motor("MTR", "mm", 0.0))
        .build()
        .unwrap();

    let real = lut.forward(&lut.make_position([15.0]).unwrap()).unwrap();
    assert_eq!(real.value("mtr").unwrap(), 1.5);
    assert_eq!(lut.wm().unwrap().value("pseudo").unwrap(), 30.0);
}

#[test]
fn test_lookup_requires_pseudo_axis() {
    let err = PseudoPositionerBuilder::new("lut", LookupTable::new(lookup_table(), ["mtr", "pseudo"]))
        .real_axis("mtr", motor("MTR", "mm", 0.0))
        .build()
        .err()
        .unwrap();
    assert!(err.is_abstract_usage());
}

// ==================== 运动与错误映射 ====================

#[test]
fn test_wrong_space_is_rejected() {
    let lut = lookup_positioner(motor("MTR", "mm", 0.0));
    let foreign = PseudoPosition::new(&beam_pseudo::AxisNames::new(["delay"]), [1.0]).unwrap();
    let err = lut.move_to(&foreign, true, None).unwrap_err();
    assert!(err.is_validation());
    assert!(lut.make_position([1.0, 2.0]).is_err());
}

#[test]
fn test_motion_timeout() {
    let slow = Arc::new(
        SimMotor::new("SLOW", "mm").with_travel_time(Duration::from_millis(500)),
    );
    let sync = PseudoPositionerBuilder::new("slow", SyncAxes::new())
        .real_axis("a", slow.clone())
        .default_timeout(Duration::from_millis(10))
        .build()
        .unwrap();

    let target = sync.make_position([1.0]).unwrap();
    let err = sync.move_to(&target, true, None).unwrap_err();
    assert_eq!(err, PseudoError::MotionTimeout { timeout_ms: 10 });
    assert!(err.is_motion_error());
    slow.stop().unwrap();
}

#[test]
fn test_motion_fault() {
    let mtr = motor("MTR", "mm", 0.0);
    let stage = PseudoPositionerBuilder::new("delay", DelayStage::default())
        .real_axis("motor", mtr.clone())
        .build()
        .unwrap();

    mtr.fail_next_move("amplifier fault");
    let err = stage.mv(&[1e-12], Some(WAIT)).unwrap_err();
    assert_eq!(err, PseudoError::MotionFault("amplifier fault".to_string()));
}

#[test]
fn test_no_wait_updates_position_on_completion() {
    let mtr = Arc::new(SimMotor::new("MTR", "mm").with_travel_time(Duration::from_millis(20)));
    let sync = PseudoPositionerBuilder::new("async", SyncAxes::new())
        .real_axis("a", mtr.clone())
        .build()
        .unwrap();

    let status = sync
        .move_to(&sync.make_position([4.0]).unwrap(), false, None)
        .unwrap();
    assert!(status.wait(Some(WAIT)).is_ok());
    assert!(eventually(|| {
        sync.last_position()
            .is_some_and(|p| p.value("pseudo").ok() == Some(4.0))
    }));
}

#[test]
fn test_timed_out_move_still_updates_position() {
    let mtr = Arc::new(SimMotor::new("MTR", "mm").with_travel_time(Duration::from_millis(50)));
    let sync = PseudoPositionerBuilder::new("late", SyncAxes::new())
        .real_axis("a", mtr.clone())
        .build()
        .unwrap();

    let target = sync.make_position([6.0]).unwrap();
    let err = sync
        .move_to(&target, true, Some(Duration::from_millis(5)))
        .unwrap_err();
    assert_eq!(err, PseudoError::MotionTimeout { timeout_ms: 5 });

    // 超时后运动继续，到位时伪位置随之刷新
    assert!(eventually(|| {
        sync.last_position()
            .is_some_and(|p| p.value("pseudo").ok() == Some(6.0))
    }));
}

#[test]
fn test_external_motion_updates_position() {
    let mtr = motor("MTR", "mm", 0.0);
    let sync = PseudoPositionerBuilder::new("manual", SyncAxes::new())
        .real_axis("a", mtr.clone())
        .build()
        .unwrap();

    sync.mv(&[1.0], None).unwrap();
    mtr.set_position(7.0);
    assert_eq!(sync.last_position().unwrap().value("pseudo").unwrap(), 7.0);
}

#[test]
fn test_dispatch_failure_stops_dispatched_axes() {
    let first = Arc::new(SimMotor::new("FIRST", "mm").with_travel_time(Duration::from_millis(50)));
    let sync = PseudoPositionerBuilder::new("partial", SyncAxes::new())
        .real_axis("a", first.clone())
        .real_axis("b", Arc::new(Rejecting))
        .build()
        .unwrap();

    let err = sync.mv(&[2.0], None).unwrap_err();
    assert!(matches!(err, PseudoError::Signal(SignalError::Io { .. })), "{}", err);
    assert_eq!(first.move_history(), vec![2.0]);
    assert!(!first.moving());

    // 被停止的运动不会到位
    thread::sleep(Duration::from_millis(100));
    assert_eq!(first.position().unwrap(), 0.0);
}

#[test]
fn test_real_limits_checked_before_moving() {
    let a = Arc::new(SimMotor::new("A", "mm").with_limits((-1.0, 1.0)));
    let b = motor("B", "mm", 0.0);
    let sync = PseudoPositionerBuilder::new("limited", SyncAxes::new())
        .real_axis("a", a.clone())
        .real_axis("b", b.clone())
        .build()
        .unwrap();

    let err = sync.mv(&[2.0], None).unwrap_err();
    assert!(err.is_validation(), "{}", err);
    assert!(a.move_history().is_empty());
    assert!(b.move_history().is_empty());
}

// ==================== Notepad ====================

#[test]
fn test_notepad_mirrors_setpoint_and_readback() {
    let hw = Arc::new(SimHardware::new());
    let mtr = motor("LAS:MMS:01", "mm", 0.0);
    let stage = PseudoPositionerBuilder::new("delay", DelayStage::default())
        .prefix("LAS:DLY")
        .real_axis("motor", mtr)
        .notepad(hw.clone())
        .build()
        .unwrap();

    stage.mv(&[2e-9], None).unwrap();
    assert!(stage.notepad().unwrap().flush(WAIT));

    let setpoint = hw.float("LAS:DLY:delay:OphydSetpoint").unwrap();
    let readback = hw.float("LAS:DLY:delay:OphydReadback").unwrap();
    assert_eq!(setpoint.value(), 2e-9);
    assert!((readback.value() - 2e-9).abs() < 1e-20);
}

#[test]
fn test_notepad_readback_follows_external_motion() {
    let hw = Arc::new(SimHardware::new());
    let mtr = motor("TST:MTR:01", "mm", 0.0);
    let sync = PseudoPositionerBuilder::new("sync", SyncAxes::new())
        .prefix("TST:SYNC")
        .real_axis("a", mtr.clone())
        .notepad(hw.clone())
        .build()
        .unwrap();

    sync.mv(&[1.0], None).unwrap();
    mtr.set_position(7.0);

    let notepad = sync.notepad().unwrap();
    assert!(notepad.flush(WAIT));
    let readback = hw.float("TST:SYNC:pseudo:OphydReadback").unwrap();
    let setpoint = hw.float("TST:SYNC:pseudo:OphydSetpoint").unwrap();
    assert_eq!(readback.value(), 7.0);
    assert_eq!(setpoint.value(), 1.0);
}

#[test]
fn test_notepad_failures_never_fail_moves() {
    let hw = Arc::new(SimHardware::new());
    let mtr = motor("MTR", "mm", 0.0);
    let sync = PseudoPositionerBuilder::new("sync", SyncAxes::new())
        .prefix("TST:SYNC")
        .real_axis("a", mtr.clone())
        .notepad(hw.clone())
        .build()
        .unwrap();

    let setpoint = hw.float("TST:SYNC:pseudo:OphydSetpoint").unwrap();
    let readback = hw.float("TST:SYNC:pseudo:OphydReadback").unwrap();
    setpoint.set_connected(false);
    readback.set_fail_puts(true);

    sync.mv(&[3.0], None).unwrap();
    assert_eq!(mtr.position().unwrap(), 3.0);

    let notepad = sync.notepad().unwrap();
    assert!(notepad.flush(WAIT));
    assert_eq!(setpoint.put_count(), 0);
    assert_eq!(readback.put_count(), 0);
    assert!(notepad.failed() >= 1);
}

#[test]
fn test_notepad_uses_explicit_axis_prefix() {
    let hw = Arc::new(SimHardware::new());
    let _sync = PseudoPositionerBuilder::new("sync", SyncAxes::new())
        .prefix("TST:SYNC")
        .pseudo_axis(PseudoAxisSpec::new("pseudo").with_prefix("TST:NOTEPAD"))
        .real_axis("a", motor("MTR", "mm", 0.0))
        .notepad(hw.clone())
        .build()
        .unwrap();

    assert!(hw.float("TST:NOTEPAD:OphydSetpoint").is_some());
    assert!(hw.float("TST:NOTEPAD:OphydReadback").is_some());
    assert!(hw.float("TST:SYNC:pseudo:OphydSetpoint").is_none());
}
