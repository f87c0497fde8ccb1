//! Content of the backend errors reported through `log`.
//!
//! This test binary installs its own logger instead of `env_logger`, so that the records emitted
//! by the device can be inspected. Records are kept per thread, as tests run concurrently.

use std::cell::RefCell;

use glint::backend::trace::TraceBackend;
use glint::{ClearMask, Device, DeviceOpt, ErrorCode};
use log::{Level, LevelFilter, Log, Metadata, Record};

thread_local! {
  static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

struct Capture;

impl Log for Capture {
  fn enabled(&self, _: &Metadata) -> bool {
    true
  }

  fn log(&self, record: &Record) {
    RECORDS.with(|records| {
      records
        .borrow_mut()
        .push((record.level(), record.args().to_string()))
    });
  }

  fn flush(&self) {}
}

static CAPTURE: Capture = Capture;

fn device(opt: DeviceOpt) -> (Device<TraceBackend>, glint::backend::trace::TraceLog) {
  // only the first test to get here installs the logger
  let _ = log::set_logger(&CAPTURE);
  log::set_max_level(LevelFilter::Trace);

  let backend = TraceBackend::new();
  let log = backend.log();

  (Device::with_opt(backend, opt), log)
}

fn errors() -> Vec<String> {
  RECORDS.with(|records| {
    records
      .borrow_mut()
      .drain(..)
      .filter(|(level, _)| *level == Level::Error)
      .map(|(_, msg)| msg)
      .collect()
  })
}

// Split `file:line: rest` into its three parts.
fn split_location(msg: &str) -> (&str, u32, &str) {
  let mut parts = msg.splitn(3, ':');
  let file = parts.next().unwrap_or_default();
  let line = parts.next().and_then(|l| l.parse().ok()).unwrap_or(0);
  let rest = parts.next().unwrap_or_default().trim_start();

  (file, line, rest)
}

#[test]
fn errors_carry_location_code_and_name() {
  let (mut device, log) = device(DeviceOpt::default());

  log.inject_error(ErrorCode(gl::INVALID_ENUM));
  log.inject_error(ErrorCode(gl::OUT_OF_MEMORY));
  device.clear(ClearMask::COLOR);

  let errors = errors();
  assert_eq!(errors.len(), 2, "{:?}", errors);

  let (file, line, rest) = split_location(&errors[0]);
  assert!(file.ends_with("device.rs"), "{}", errors[0]);
  assert!(line > 0, "{}", errors[0]);
  assert_eq!(rest, "backend error 0x0500: GL_INVALID_ENUM");

  let (file, _, rest) = split_location(&errors[1]);
  assert!(file.ends_with("device.rs"), "{}", errors[1]);
  assert_eq!(rest, "backend error 0x0505: GL_OUT_OF_MEMORY");
}

#[test]
fn label_prefixes_errors() {
  let (mut device, log) = device(DeviceOpt::default().set_label("shadow pass".to_owned()));

  log.inject_error(ErrorCode(gl::INVALID_OPERATION));
  device.clear(ClearMask::DEPTH);

  let errors = errors();
  assert_eq!(errors.len(), 1, "{:?}", errors);

  let msg = errors[0]
    .strip_prefix("[shadow pass] ")
    .unwrap_or_else(|| panic!("missing label: {}", errors[0]));
  let (file, _, rest) = split_location(msg);
  assert!(file.ends_with("device.rs"), "{}", msg);
  assert_eq!(rest, "backend error 0x0502: GL_INVALID_OPERATION");
}

#[test]
fn unknown_codes_are_reported_as_such() {
  let (mut device, log) = device(DeviceOpt::default());

  log.inject_error(ErrorCode(0x1234));
  device.clear(ClearMask::COLOR);

  let errors = errors();
  assert_eq!(errors.len(), 1, "{:?}", errors);
  assert!(errors[0].ends_with("backend error 0x1234: unknown"), "{}", errors[0]);
}

#[test]
fn a_check_reports_at_most_eight_errors() {
  let (mut device, log) = device(DeviceOpt::default());

  for _ in 0..10 {
    log.inject_error(ErrorCode(gl::INVALID_VALUE));
  }

  device.clear(ClearMask::COLOR);
  assert_eq!(errors().len(), 8);
  assert_eq!(log.pending_errors(), 2);
}

#[test]
fn disabled_checks_log_nothing() {
  let (mut device, log) = device(DeviceOpt::default().set_error_checks(false));

  log.inject_error(ErrorCode(gl::INVALID_VALUE));
  device.clear(ClearMask::COLOR);

  assert!(errors().is_empty());
  assert_eq!(log.pending_errors(), 1);
}
