use anyhow::Result;
use proc_macro2::TokenStream;
use quote::quote;
use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    boot::BootConfiguration,
    features::{ForcePin, Interfaces, SiliconPolicy},
    memory::FlashSize,
    Configuration,
};

use super::BOARD_CONFIGURATION_FILE;

pub fn generate_board_configuration(out_dir: &Path, configuration: &Configuration) -> Result<PathBuf> {
    let path = out_dir.join(BOARD_CONFIGURATION_FILE);
    let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(&path)?;
    let code = board_configuration(configuration);
    file.write_all(format!("{}", code).as_bytes())?;
    Ok(path)
}

/// Rust source for the constants describing one board.
pub fn board_configuration(configuration: &Configuration) -> TokenStream {
    let name = configuration.port.to_string();
    let flash_size = configuration.memory_configuration.flash_size.bytes();
    let reservation = configuration.memory_configuration.reservation_bytes();
    let systick_mhz = configuration.port.systick_mhz();

    let policy = boot_policy(&configuration.boot_configuration);
    let layout = flash_layout(configuration);
    let interfaces = interfaces(&configuration.feature_configuration.interfaces);
    let force_pin = force_pin(&configuration.feature_configuration.force_pin);
    let silicon = silicon(&configuration.feature_configuration.silicon);

    quote! {
        /// Board the core was configured for.
        pub const BOARD: crate::devices::board::BoardDescription =
            crate::devices::board::BoardDescription {
                name: #name,
                flash_size: #flash_size,
                reservation: #reservation,
                systick_mhz: #systick_mhz,
            };
        pub const BOOT_POLICY: crate::devices::boot_decision::Policy = #policy;
        pub const FLASH_LAYOUT: crate::devices::flash::FlashLayout = #layout;
        pub const INTERFACES: crate::devices::bootloader::Interfaces = #interfaces;
        pub const FORCE_PIN: crate::devices::sampling::ForcePin = #force_pin;
        pub const SILICON: crate::devices::identity::SiliconPolicy = #silicon;
    }
}

fn boot_policy(boot: &BootConfiguration) -> TokenStream {
    let default_timeout = boot.bootloader_delay_ms;
    let fail_detect = boot.fail_detect;
    let boot_delay = match &boot.boot_delay {
        Some(delay) => {
            let (offset, signature1, signature2, max_seconds) =
                (delay.offset, delay.signature1, delay.signature2, delay.max_seconds);
            quote! {
                Some(crate::devices::boot_decision::BootDelay {
                    offset: #offset,
                    signature1: #signature1,
                    signature2: #signature2,
                    max_delay: crate::hal::time::Seconds(#max_seconds),
                })
            }
        }
        None => quote! { None },
    };

    quote! {
        crate::devices::boot_decision::Policy {
            default_timeout: crate::hal::time::Milliseconds(#default_timeout),
            boot_delay: #boot_delay,
            fail_detect: #fail_detect,
        }
    }
}

fn flash_layout(configuration: &Configuration) -> TokenStream {
    let sectors = match configuration.memory_configuration.flash_size {
        FlashSize::OneMegabyte => quote! { crate::devices::flash::STM32F4_1M_SECTORS },
        FlashSize::TwoMegabytes => quote! { crate::devices::flash::STM32F4_2M_SECTORS },
    };
    let constants = configuration.port.memory_constants();
    let flash_base = constants.flash_base;
    let load_address = constants.flash_base + configuration.memory_configuration.reservation_bytes();
    let (otp_base, otp_size, unique_id_base) =
        (constants.otp_base, constants.otp_size, constants.unique_id_base);

    quote! {
        crate::devices::flash::FlashLayout {
            sectors: &#sectors,
            flash_base: #flash_base,
            load_address: #load_address,
            otp_base: #otp_base,
            otp_size: #otp_size,
            unique_id_base: #unique_id_base,
        }
    }
}

fn interfaces(interfaces: &Interfaces) -> TokenStream {
    let (usart, usb) = (interfaces.usart, interfaces.usb);
    quote! { crate::devices::bootloader::Interfaces { usart: #usart, usb: #usb } }
}

fn force_pin(force_pin: &ForcePin) -> TokenStream {
    match force_pin {
        ForcePin::Disabled => quote! { crate::devices::sampling::ForcePin::Disabled },
        ForcePin::Tied => quote! { crate::devices::sampling::ForcePin::Tied },
        ForcePin::Pulled { active_high } => {
            quote! { crate::devices::sampling::ForcePin::Pulled { active_high: #active_high } }
        }
    }
}

fn silicon(silicon: &SiliconPolicy) -> TokenStream {
    let (first_bad, limit_small_flash) = (silicon.first_bad_offset, silicon.limit_small_flash);
    quote! {
        crate::devices::identity::SiliconPolicy {
            mcus: &crate::devices::identity::STM32F4_MCUS,
            revisions: crate::devices::identity::RevisionTable {
                entries: &crate::devices::identity::STM32F4_REVISIONS,
                first_bad: #first_bad,
            },
            limit_small_flash: #limit_small_flash,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = include_str!("../../sample_configurations/fmu_v2.ron");

    fn generated(configuration: &Configuration) -> String {
        board_configuration(configuration).to_string().split_whitespace().collect()
    }

    #[test]
    fn generated_module_declares_every_constant() {
        let code = generated(&Configuration::from_ron(SAMPLE).unwrap());
        for constant in
            ["BOARD", "BOOT_POLICY", "FLASH_LAYOUT", "INTERFACES", "FORCE_PIN", "SILICON"]
        {
            assert!(code.contains(&format!("pubconst{}:", constant)), "missing {}", constant);
        }
    }

    #[test]
    fn flash_size_selects_sector_table_and_load_address() {
        // Given
        let mut configuration = Configuration::from_ron(SAMPLE).unwrap();

        // When
        let large = generated(&configuration);
        configuration.memory_configuration.flash_size = FlashSize::OneMegabyte;
        let small = generated(&configuration);

        // Then
        assert!(large.contains("STM32F4_2M_SECTORS"));
        assert!(small.contains("STM32F4_1M_SECTORS"));
        // 0x0800_8000
        assert!(large.contains("load_address:134250496u32"));
    }

    #[test]
    fn absent_boot_delay_generates_none() {
        let mut configuration = Configuration::from_ron(SAMPLE).unwrap();
        configuration.boot_configuration.boot_delay = None;
        assert!(generated(&configuration).contains("boot_delay:None"));
    }

    #[test]
    fn pulled_force_pin_keeps_its_level() {
        let mut configuration = Configuration::from_ron(SAMPLE).unwrap();
        configuration.feature_configuration.force_pin = ForcePin::Pulled { active_high: true };
        assert!(generated(&configuration).contains("ForcePin::Pulled{active_high:true}"));
    }

    #[test]
    fn generated_module_is_written_to_the_output_directory() {
        let out_dir = std::env::temp_dir().join("sdboot_config_codegen_test");
        std::fs::create_dir_all(&out_dir).unwrap();

        let path =
            generate_board_configuration(&out_dir, &Configuration::from_ron(SAMPLE).unwrap())
                .unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("BOOT_POLICY"));
    }
}
