use std::sync::{Mutex, MutexGuard, Once};

use esp8266_skill::{
    debug, exception, info,
    skills::esp8266::{COMMAND_KEYWORD, MODULE_KEYWORD},
    warning, DeviceClient, DeviceError, DeviceRequest, Esp8266Skill, Message, TemplateDialog,
};
use log::{LevelFilter, Log, Metadata, Record};

/// Keeps `<target>|<LEVEL>|<message>` for every record it sees.
struct Capture {
    records: Mutex<Vec<String>>,
}

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records.lock().unwrap().push(format!(
            "{}|{}|{}",
            record.target(),
            record.level(),
            record.args()
        ));
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    records: Mutex::new(Vec::new()),
};
static INSTALL: Once = Once::new();
static SERIAL: Mutex<()> = Mutex::new(());

/// Installs the capturing logger once and serializes tests that read it.
fn capture(level: LevelFilter) -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    INSTALL.call_once(|| log::set_logger(&CAPTURE).unwrap());
    log::set_max_level(level);
    CAPTURE.records.lock().unwrap().clear();
    guard
}

fn records() -> Vec<String> {
    CAPTURE.records.lock().unwrap().clone()
}

#[test]
fn explicit_name_applies_to_one_record() {
    let _guard = capture(LevelFilter::Trace);

    info!(name: "custom"; "one {}", 1);
    let line = line!(); info!("two");

    assert_eq!(
        records(),
        [
            "custom|INFO|one 1".to_owned(),
            format!("logging:explicit_name_applies_to_one_record:{line}|INFO|two"),
        ]
    );
}

#[test]
fn each_line_gets_its_own_identity() {
    let _guard = capture(LevelFilter::Trace);

    let line = line!();
    debug!("first");
    debug!("second");

    assert_eq!(
        records(),
        [
            format!("logging:each_line_gets_its_own_identity:{}|DEBUG|first", line + 1),
            format!("logging:each_line_gets_its_own_identity:{}|DEBUG|second", line + 2),
        ]
    );
}

#[test]
fn records_above_the_threshold_are_dropped() {
    let _guard = capture(LevelFilter::Info);

    debug!("hidden");
    warning!(name: "custom"; "shown");

    assert_eq!(records(), ["custom|WARN|shown".to_owned()]);
}

#[test]
fn exception_appends_the_error() {
    let _guard = capture(LevelFilter::Trace);

    let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
    exception!(name: "custom"; err, "while sending {}", "led_0");

    assert_eq!(records(), ["custom|ERROR|while sending led_0\nError: boom".to_owned()]);
}

struct Unavailable;

impl DeviceClient for Unavailable {
    fn send(&self, _request: &DeviceRequest) -> Result<(), DeviceError> {
        Err(DeviceError::Status(503))
    }
}

#[test]
fn device_failure_is_logged_under_the_skill_module() {
    let _guard = capture(LevelFilter::Trace);

    let skill = Esp8266Skill::with_client(Unavailable);
    let message = Message::utterance()
        .with_keyword(MODULE_KEYWORD, "fan")
        .with_keyword(COMMAND_KEYWORD, "toggle");
    skill.handle_single_command(&message, &mut TemplateDialog::new(Vec::new()));

    let errors: Vec<String> = records()
        .into_iter()
        .filter(|r| r.contains("|ERROR|"))
        .collect();
    assert_eq!(
        errors,
        ["esp8266_skill::skills::esp8266|ERROR|Error: device answered with HTTP 503".to_owned()]
    );
}
