use bramy::{CarConfig, CarError};
use std::io::Write;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_constants() {
        let config = CarConfig::default();
        assert_eq!(config.can.channel, "can0");
        assert_eq!(config.can.arbitration_id, 0x21);
        assert_eq!(config.ros.image_topic, "color_image");
        assert_eq!((config.control.initial_speed, config.control.initial_angle), (0, 90));
        assert_eq!((config.control.speed_step, config.control.angle_step), (25, 10));
        assert_eq!(config.camera.frame_rate, 30.0);
        assert!(config.target_dir().ends_with("Downloads/Target"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "can:\n  channel: vcan0\ncapture:\n  target_dir: /tmp/frames").unwrap();

        let config = CarConfig::load(file.path()).unwrap();
        assert_eq!(config.can.channel, "vcan0");
        assert_eq!(config.can.arbitration_id, 0x21);
        assert_eq!(config.target_dir(), std::path::PathBuf::from("/tmp/frames"));
        assert_eq!(config.control.speed_step, 25);
    }

    #[test]
    fn test_extended_id_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "can:\n  arbitration_id: 4096").unwrap();
        assert!(matches!(CarConfig::load(file.path()), Err(CarError::Can(_))));
    }

    #[test]
    fn test_invalid_yaml_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "control: [not, a, map]").unwrap();
        assert!(matches!(CarConfig::load(file.path()), Err(CarError::Config(_))));
        assert!(matches!(CarConfig::load("/nonexistent/car.yaml"), Err(CarError::Config(_))));
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = CarConfig::load_or_default(None).unwrap();
        assert_eq!(config.ros.node_name, "get_control");
    }
}
