#![no_main]

use libfuzzer_sys::fuzz_target;
use snapsheet::{SheetConfig, SheetController, StaticLayout};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = SheetConfig::from_toml_str(text) else {
        return;
    };

    // Anything the loader accepts must drive a controller.
    let mut sheet = SheetController::new(config).expect("loader validated the config");
    sheet
        .update_layout(&StaticLayout::new(390.0, 844.0))
        .expect("validated points resolve");
    assert!(sheet.offset().is_finite(), "initial offset not finite");
});
