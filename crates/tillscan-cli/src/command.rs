//! Interactive command parsing.

use std::str::FromStr;

use tillscan_hardware::Facing;

/// One line typed at the demo prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(Option<String>),
    Close,
    Stop,
    Facing(Facing),
    Device(String),
    Retry,
    /// Make the mock camera decode a payload.
    Decode(String),
    Miss,
    /// Type characters with no terminator, as a scanner without Enter.
    Type(String),
    /// Type characters followed by Enter.
    Scan(String),
    Manual(String),
    /// Deny camera permission on the next acquire.
    Deny,
    Devices,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  open [title]      open the scanner panel
  close             close the panel
  stop              stop the camera (emits Closed)
  front | back      switch camera facing
  device <id>       switch to a device
  retry             retry after a camera failure
  decode <text>     camera decodes <text>
  miss              camera frame without a code
  type <text>       keyboard burst without Enter
  scan <text>       keyboard burst ending with Enter
  manual <text>     manual entry
  deny              fail the next camera start with a permission error
  devices | status | help | quit";

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_start();
        let (word, rest) = line.split_once(' ').unwrap_or((line.trim_end(), ""));
        let argument = |name: &str| {
            let rest = rest.trim();
            if rest.is_empty() {
                Err(format!("{name} needs an argument"))
            } else {
                Ok(rest.to_owned())
            }
        };

        match word.to_lowercase().as_str() {
            "open" => Ok(Self::Open(Some(rest.trim()).filter(|t| !t.is_empty()).map(str::to_owned))),
            "close" => Ok(Self::Close),
            "stop" => Ok(Self::Stop),
            "front" | "back" => word.parse().map(Self::Facing),
            "device" => argument("device").map(Self::Device),
            "retry" => Ok(Self::Retry),
            "decode" => argument("decode").map(Self::Decode),
            "miss" => Ok(Self::Miss),
            "type" => argument("type").map(Self::Type),
            "scan" => argument("scan").map(Self::Scan),
            // manual entry keeps its padding; trimming is the scanner's job
            "manual" => Ok(Self::Manual(rest.to_owned())),
            "deny" => Ok(Self::Deny),
            "devices" => Ok(Self::Devices),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command: {other} (try `help`)")),
        }
    }
}
