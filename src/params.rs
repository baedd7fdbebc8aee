//! Simulation configuration: wave trains, field resolution, lookup sizing.

/// One circular/orbital wave train. All fields are read once per simulation
/// step; the simulator never mutates them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParams {
    /// Radius of the orbital path surface points travel along (world units)
    pub orbit_radius: f32,
    /// Spatial frequency (radians per world unit of distance from center)
    pub wave_number: f32,
    /// Temporal frequency (radians per second)
    pub angular_speed: f32,
    /// Cap on horizontal stretch of the orbit
    pub max_stretch: f32,
    /// Cap on total vertical displacement
    pub max_displacement: f32,
    /// Scale applied to the lookup-weighted displacement
    pub displacement_factor: f32,
    /// Wave origin in the unit-square surface domain
    pub center: [f32; 2],
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            orbit_radius: 0.02,
            wave_number: 40.0,
            angular_speed: 2.0,
            max_stretch: 1.5,
            max_displacement: 0.08,
            displacement_factor: 1.0,
            center: [0.5, 0.5],
        }
    }
}

/// Host-facing configuration surface. Changing `resolution` or `lookup_size`
/// takes effect on the next `reconfigure` call; the owning component releases
/// the old GPU resource before allocating the new one.
#[derive(Debug, Clone)]
pub struct OceanConfig {
    /// Field texture width/height and mesh grid resolution
    pub resolution: u32,
    /// Lookup table sample count (values < 2 leave the prior table in place)
    pub lookup_size: u32,
    /// Ordered wave trains; empty list freezes the field (step becomes a no-op)
    pub waves: Vec<WaveParams>,
    /// Write the field textures to PNGs for offline inspection
    pub dump_fields: bool,
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            resolution: 256,
            lookup_size: 128,
            waves: vec![
                WaveParams::default(),
                WaveParams {
                    orbit_radius: 0.012,
                    wave_number: 70.0,
                    angular_speed: 3.1,
                    center: [0.1, 0.85],
                    ..WaveParams::default()
                },
                WaveParams {
                    orbit_radius: 0.016,
                    wave_number: 55.0,
                    angular_speed: 2.6,
                    center: [0.9, 0.2],
                    ..WaveParams::default()
                },
            ],
            dump_fields: false,
        }
    }
}

impl OceanConfig {
    /// Validate configuration. An empty wave list and an undersized lookup
    /// table are deliberate degenerate modes, not errors; only values the
    /// renderer cannot work with are rejected.
    pub fn validate(&self) -> Result<(), String> {
        if self.resolution < 2 {
            return Err(format!(
                "resolution must be at least 2, got {}",
                self.resolution
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(OceanConfig::default().validate().is_ok());
    }

    #[test]
    fn test_sub_minimum_resolution_rejected() {
        let config = OceanConfig {
            resolution: 1,
            ..OceanConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_wave_list_is_valid_degenerate_mode() {
        let config = OceanConfig {
            waves: vec![],
            lookup_size: 0,
            ..OceanConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
