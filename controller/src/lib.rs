//! Cartreader - host side of the cartridge reader bridge
//!
//! Real implementations of the `cartreader_core::host` traits for a
//! Raspberry Pi running RetroPie, plus the threads that feed the event
//! queue: serial link, power switch, temperature and OS signals.

mod command;
pub mod frontend;
pub mod gpio;
pub mod launcher;
pub mod link;
pub mod process;
pub mod sensor;
pub mod signals;
pub mod status;

pub use frontend::HostSystem;
pub use launcher::ShellLauncher;
pub use process::SysProcessControl;
pub use sensor::TemperatureSource;
pub use status::RomDetailsFile;
