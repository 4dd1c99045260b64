use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BootConfiguration {
    /// How long the recovery service listens on a normal power-up. Zero waits forever.
    pub bootloader_delay_ms: u32,
    /// Lets a previously running application ask for a longer listening window.
    pub boot_delay: Option<BootDelay>,
    /// Arm the retained dead-man signature before each jump from the recovery
    /// loop, so an application that never clears it lands back in recovery on
    /// the next reset. Boards should leave this on.
    pub fail_detect: bool,
}

impl Default for BootConfiguration {
    fn default() -> Self { Self { bootloader_delay_ms: 5000, boot_delay: None, fail_detect: true } }
}

/// Location and signature of the boot delay request embedded in the application image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BootDelay {
    /// Byte offset from the application load address.
    pub offset: u32,
    pub signature1: u32,
    pub signature2: u32,
    pub max_seconds: u32,
}
