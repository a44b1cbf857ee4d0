//! Encoders: one wrapping layer per hop.
//!
//! Encoders are stateless text transformations. The only chain-aware encoder
//! is [`WmicEncoder`], which uses the prepare pass to learn its position.

pub mod escape;

mod curl;
mod echo;
mod plain;
mod powershell;
mod ssh;
mod wincmd;
mod wmic;
mod xpcmdshell;

pub use curl::CurlEncoder;
pub use echo::EchoEncoder;
pub use plain::CmdEncoder;
pub use powershell::PowerShellEncoder;
pub use ssh::SshEncoder;
pub use wincmd::WinCmdEncoder;
pub use wmic::WmicEncoder;
pub use xpcmdshell::XpCmdShellEncoder;
