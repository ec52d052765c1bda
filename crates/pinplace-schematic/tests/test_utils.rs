use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const DEVICE_LIB: &str = r##"(kicad_symbol_lib (version 20231120) (generator kicad_symbol_editor)
  (symbol "R" (pin_numbers hide) (pin_names (offset 0)) (in_bom yes) (on_board yes)
    (property "Reference" "R" (at 2.032 0 90))
    (property "Value" "R" (at 0 0 90))
    (symbol "R_1_1"
      (pin passive line (at 0 3.81 270) (length 1.27) (name "~") (number "1"))
      (pin passive line (at 0 -3.81 90) (length 1.27) (name "~") (number "2"))))
  (symbol "LED"
    (symbol "LED_1_1"
      (pin passive line (at -3.81 0 0) (length 2.54) (name "K") (number "1"))
      (pin passive line (at 3.81 0 180) (length 2.54) (name "A") (number "2")))))
"##;

pub const POWER_LIB: &str = r##"(kicad_symbol_lib (version 20231120)
  (symbol "GND" (power) (pin_names (offset 0))
    (property "Reference" "#PWR" (at 0 -6.35 0))
    (symbol "GND_1_1"
      (pin power_in line (at 0 0 270) (length 0) hide (name "GND") (number "1"))))
  (symbol "+3V3" (power)
    (symbol "+3V3_1_1"
      (pin power_in line (at 0 0 90) (length 0) hide (name "+3V3") (number "1")))))
"##;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A project directory with the two libraries under `lib/` and `scene` written
/// to `scene.toml`. Returns the directory and the scene path.
pub fn setup_scene(scene: &str) -> (TempDir, PathBuf) {
    init_logger();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let lib = dir.path().join("lib");
    fs::create_dir(&lib).expect("Failed to create lib dir");
    write(&lib.join("Device.kicad_sym"), DEVICE_LIB);
    write(&lib.join("power.kicad_sym"), POWER_LIB);

    let scene_path = dir.path().join("scene.toml");
    write(&scene_path, scene);
    (dir, scene_path)
}

fn write(path: &Path, content: &str) {
    fs::write(path, content).expect("Failed to write fixture");
}
