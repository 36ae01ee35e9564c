//! Loader for the `landspill.data` file set.
//!
//! The parent file holds the fluid properties and tolerances and names four
//! child files. Relative child paths, and relative raster paths inside the
//! children, resolve against the directory of the file that names them.
//!
//! ```text
//! landspill.data
//! ├── point_source.data     n_point_sources, then id/coord/n_times/end_times/vol_rates
//! ├── darcy_weisbach.data   type, friction_tol, dry_tol, per-type entries
//! ├── hydro_feature.data    n_files, then "file i" per raster
//! └── evaporation.data      type, n_coefficients, then C0, C1, ...
//! ```

use std::path::{Path, PathBuf};

use crate::config::{
    ConfigError, EvaporationConfig, EvaporationKind, FrictionBlock, FrictionConfig, FrictionKind,
    LandspillConfig, PointSourceConfig,
};
use crate::io::DataFile;
use crate::types::Bounds2D;

/// Read the parent file and every child it names.
pub(crate) fn read_landspill_data(path: &Path) -> Result<LandspillConfig, ConfigError> {
    let base = parent_dir(path);
    let mut file = DataFile::load(path)?;

    let mut config = LandspillConfig {
        ref_mu: file.read_f64("ref_mu")?,
        ref_temperature: file.read_f64("ref_temperature")?,
        ambient_temperature: file.read_f64("ambient_temperature")?,
        density: file.read_f64("density")?,
        ..LandspillConfig::default()
    };

    let update_tol = file.read_f64("update_tol")?;
    config.update_tol = update_tol.is_finite().then_some(update_tol);
    let refine_tol = file.read_f64("refine_tol")?;
    if refine_tol.is_finite() {
        config.refine_tol = refine_tol;
    }

    let point_sources_file = resolve(&base, &file.read_string("point_sources_file")?);
    let friction_file = resolve(&base, &file.read_string("darcy_weisbach_file")?);
    let hydro_file = resolve(&base, &file.read_string("hydro_feature_file")?);
    let evaporation_file = resolve(&base, &file.read_string("evaporation_file")?);

    config.point_sources = read_point_sources(&point_sources_file)?;
    config.friction = read_friction(&friction_file)?;
    config.hydro_features = read_hydro_features(&hydro_file)?;
    config.evaporation = read_evaporation(&evaporation_file)?;
    Ok(config)
}

/// Read `point_source.data`.
pub(crate) fn read_point_sources(path: &Path) -> Result<Vec<PointSourceConfig>, ConfigError> {
    let mut file = DataFile::load(path)?;
    let n_sources = file.read_usize("n_point_sources")?;

    let mut sources = Vec::with_capacity(n_sources);
    for index in 0..n_sources {
        file.read_usize("id")?;
        let coord = file.read_f64s("coord")?;
        if coord.len() != 2 {
            return Err(ConfigError::invalid(
                format!("point_sources[{}].coord", index),
                format!("expected 2 values, found {}", coord.len()),
            ));
        }
        let n_times = file.read_usize("n_times")?;
        let end_times = file.read_f64s("end_times")?;
        let rates = file.read_f64s("vol_rates")?;
        if end_times.len() != n_times || rates.len() != n_times {
            return Err(ConfigError::StageCountMismatch {
                source_index: index,
                n_times: end_times.len(),
                n_rates: rates.len(),
            });
        }
        sources.push(PointSourceConfig::new((coord[0], coord[1]), end_times, rates));
    }
    Ok(sources)
}

/// Read `darcy_weisbach.data`.
pub(crate) fn read_friction(path: &Path) -> Result<FrictionConfig, ConfigError> {
    let base = parent_dir(path);
    let mut file = DataFile::load(path)?;
    let kind = FrictionKind::from_code(file.read_i64("type")?)?;

    let mut config = FrictionConfig {
        kind,
        ..FrictionConfig::default()
    };
    if kind == FrictionKind::None {
        return Ok(config);
    }

    config.friction_tol = file.read_f64("friction_tol")?;
    let dry_tol = file.read_f64("dry_tol")?;
    config.dry_tol = dry_tol.is_finite().then_some(dry_tol);

    match kind {
        FrictionKind::None => {}
        FrictionKind::Constant => config.coefficient = file.read_f64("coefficient")?,
        FrictionKind::BlockConstant => {
            config.default_coefficient = file.read_f64("default_coefficient")?;
            let n_blocks = file.read_usize("n_blocks")?;
            let xlowers = file.read_f64s("xlowers")?;
            let xuppers = file.read_f64s("xuppers")?;
            let ylowers = file.read_f64s("ylowers")?;
            let yuppers = file.read_f64s("yuppers")?;
            let coefficients = file.read_f64s("coefficients")?;

            let lengths = [
                xlowers.len(),
                xuppers.len(),
                ylowers.len(),
                yuppers.len(),
                coefficients.len(),
            ];
            if lengths.iter().any(|&n| n != n_blocks) {
                return Err(ConfigError::invalid(
                    "friction.blocks",
                    format!("n_blocks is {} but block lists have lengths {:?}", n_blocks, lengths),
                ));
            }

            config.blocks = (0..n_blocks)
                .map(|k| {
                    Bounds2D::try_new(xlowers[k], xuppers[k], ylowers[k], yuppers[k])
                        .map(|bounds| FrictionBlock {
                            bounds,
                            coefficient: coefficients[k],
                        })
                        .ok_or_else(|| {
                            ConfigError::invalid(
                                format!("friction.blocks[{}]", k),
                                "lower corner must be strictly below upper corner",
                            )
                        })
                })
                .collect::<Result<_, _>>()?;
        }
        FrictionKind::CellRaster => {
            config.raster_file = Some(resolve(&base, &file.read_string("filename")?));
            config.default_coefficient = file.read_f64("default_coefficient")?;
        }
        FrictionKind::ThreeRegime | FrictionKind::Churchill | FrictionKind::TwoRegime => {
            config.raster_file = Some(resolve(&base, &file.read_string("filename")?));
            config.default_roughness = file.read_f64("default_roughness")?;
        }
    }
    Ok(config)
}

/// Read `hydro_feature.data`.
pub(crate) fn read_hydro_features(path: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let base = parent_dir(path);
    let mut file = DataFile::load(path)?;
    let n_files = file.read_usize("n_files")?;
    (0..n_files)
        .map(|i| Ok(resolve(&base, &file.read_string(&format!("file {}", i))?)))
        .collect()
}

/// Read `evaporation.data`.
pub(crate) fn read_evaporation(path: &Path) -> Result<EvaporationConfig, ConfigError> {
    let mut file = DataFile::load(path)?;
    let kind = EvaporationKind::from_code(file.read_i64("type")?)?;
    let n_coefficients = file.read_usize("n_coefficients")?;
    let coefficients = (0..n_coefficients)
        .map(|i| file.read_f64(&format!("C{}", i)))
        .collect::<Result<_, _>>()?;
    Ok(EvaporationConfig { kind, coefficients })
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn resolve(base: &Path, name: &str) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_set(dir: &Path, friction: &str, evaporation: &str) {
        fs::write(
            dir.join("landspill.data"),
            "\
332.0      =: ref_mu  Reference dynamic viscosity (mPa-s)
15.0       =: ref_temperature  Reference temperature
25.0       =: ambient_temperature  Ambient temperature (Celsius)
926.6      =: density  Density at ambient temperature
None       =: update_tol
0.0        =: refine_tol
'point_source.data'    =: point_sources_file
'darcy_weisbach.data'  =: darcy_weisbach_file
'hydro_feature.data'   =: hydro_feature_file
'evaporation.data'     =: evaporation_file
",
        )
        .unwrap();
        fs::write(
            dir.join("point_source.data"),
            "\
1 =: n_point_sources

0 =: id
10.0 11.0 =: coord
3 =: n_times
60.0 1800.0 7200.0 =: end_times
1.0 0.5 0.1 =: vol_rates
",
        )
        .unwrap();
        fs::write(dir.join("darcy_weisbach.data"), friction).unwrap();
        fs::write(
            dir.join("hydro_feature.data"),
            "1 =: n_files\n'hydro_0.asc' =: file 0\n",
        )
        .unwrap();
        fs::write(dir.join("evaporation.data"), evaporation).unwrap();
    }

    #[test]
    fn test_full_set() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        write_set(
            dir,
            "\
2 =: type
1e6 =: friction_tol
1e-4 =: dry_tol
0.25 =: default_coefficient
2 =: n_blocks
0.0 10.0 =: xlowers
10.0 20.0 =: xuppers
0.0 0.0 =: ylowers
10.0 10.0 =: yuppers
0.1 0.5 =: coefficients
",
            "1 =: type\n2 =: n_coefficients\n1.38 =: C0\n0.045 =: C1\n",
        );

        let config = read_landspill_data(&dir.join("landspill.data")).unwrap();
        assert_eq!(config.ref_mu, 332.0);
        assert_eq!(config.update_tol, None);
        assert_eq!(config.update_tol(), config.dry_tolerance);
        assert_eq!(config.point_sources.len(), 1);
        assert_eq!(config.point_sources[0].location, (10.0, 11.0));
        assert_eq!(config.point_sources[0].rates, vec![1.0, 0.5, 0.1]);

        assert_eq!(config.friction.kind, FrictionKind::BlockConstant);
        assert_eq!(config.friction.blocks.len(), 2);
        assert_eq!(config.friction.blocks[1].coefficient, 0.5);
        assert_eq!(config.friction.dry_tol, Some(1e-4));

        assert_eq!(config.hydro_features, vec![dir.join("hydro_0.asc")]);
        assert_eq!(config.evaporation.kind, EvaporationKind::FingasLog);
        assert_eq!(config.evaporation.coefficients, vec![1.38, 0.045]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_friction_disabled_stops_after_type() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        write_set(dir, "0 =: type\n", "0 =: type\n0 =: n_coefficients\n");
        let config = read_landspill_data(&dir.join("landspill.data")).unwrap();
        assert_eq!(config.friction.kind, FrictionKind::None);
        assert_eq!(config.evaporation.kind, EvaporationKind::None);
    }

    #[test]
    fn test_regime_friction_resolves_raster_path() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        write_set(
            dir,
            "\
4 =: type
1e6 =: friction_tol
1e-4 =: dry_tol
'roughness.asc' =: filename  Escri ASCII file for roughness
0.001 =: default_roughness
",
            "0 =: type\n0 =: n_coefficients\n",
        );
        let config = read_landspill_data(&dir.join("landspill.data")).unwrap();
        assert_eq!(config.friction.kind, FrictionKind::ThreeRegime);
        assert_eq!(config.friction.raster_file, Some(dir.join("roughness.asc")));
        assert_eq!(config.friction.default_roughness, 0.001);
    }

    #[test]
    fn test_unknown_friction_type() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        write_set(dir, "9 =: type\n", "0 =: type\n0 =: n_coefficients\n");
        assert!(matches!(
            read_landspill_data(&dir.join("landspill.data")),
            Err(ConfigError::UnknownFrictionType(9))
        ));
    }
}
