//! Voice-assistant skill that forwards spoken commands to an ESP8266 board,
//! plus the caller-qualified logging every skill shares.

pub mod device;
pub mod intent;
pub mod logging;
pub mod skills;

pub use device::{DeviceClient, DeviceError, DeviceRequest, HttpDeviceClient};
pub use logging::{LogConfig, Logger};
pub use skills::{esp8266::Esp8266Skill, Dialog, Message, Skill, SkillHost, TemplateDialog};
