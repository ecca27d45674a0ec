use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Wildcard residue name in the atom-typing table, matching any residue.
pub const ANY_RESIDUE: &str = "*";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct VdwParam {
    pub radius: f64,
    pub well_depth: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GlobalParams {
    pub dielectric_constant: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NonBondedParams {
    pub globals: GlobalParams,
    pub vdw: HashMap<String, VdwParam>,
}

/// One row of the atom-typing table.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AtomTypeRecord {
    pub residue: String,
    pub atom: String,
    pub ff_type: String,
    pub charge: f64,
}

#[derive(Debug, Clone)]
pub struct Forcefield {
    pub non_bonded: NonBondedParams,
    pub atom_types: HashMap<(String, String), AtomTypeRecord>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

impl Forcefield {
    pub fn load(non_bonded_path: &Path, atom_types_path: &Path) -> Result<Self, ParamLoadError> {
        let non_bonded = Self::load_non_bonded(non_bonded_path)?;
        let atom_types = Self::load_atom_types_csv(atom_types_path)?;

        Ok(Self {
            non_bonded,
            atom_types,
        })
    }

    /// Looks up the typing record for an atom, falling back to the wildcard residue.
    pub fn atom_type(&self, residue_name: &str, atom_name: &str) -> Option<&AtomTypeRecord> {
        self.atom_types
            .get(&(residue_name.to_string(), atom_name.to_string()))
            .or_else(|| {
                self.atom_types
                    .get(&(ANY_RESIDUE.to_string(), atom_name.to_string()))
            })
    }

    pub fn vdw(&self, ff_type: &str) -> Option<&VdwParam> {
        self.non_bonded.vdw.get(ff_type)
    }

    fn load_non_bonded(path: &Path) -> Result<NonBondedParams, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    fn load_atom_types_csv(
        path: &Path,
    ) -> Result<HashMap<(String, String), AtomTypeRecord>, ParamLoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| ParamLoadError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

        let mut atom_types = HashMap::new();
        for result in reader.deserialize::<AtomTypeRecord>() {
            let record = result.map_err(|e| ParamLoadError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            atom_types.insert((record.residue.clone(), record.atom.clone()), record);
        }
        Ok(atom_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn load_non_bonded_succeeds_with_valid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            r#"
            [globals]
            dielectric_constant = 4.0

            [vdw.C]
            radius = 3.8
            well_depth = 0.1

            [vdw.N]
            radius = 3.2
            well_depth = 0.05
            "#
        )
        .unwrap();

        let params = Forcefield::load_non_bonded(&file_path).unwrap();
        assert_eq!(params.globals.dielectric_constant, 4.0);
        assert_eq!(
            params.vdw.get("N"),
            Some(&VdwParam {
                radius: 3.2,
                well_depth: 0.05,
            })
        );
    }

    #[test]
    fn load_non_bonded_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("non_existent.toml");
        let result = Forcefield::load_non_bonded(&file_path);
        assert!(matches!(result, Err(ParamLoadError::Io { .. })));
    }

    #[test]
    fn load_non_bonded_fails_for_malformed_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("malformed.toml");
        fs::write(&file_path, "this is not toml").unwrap();
        let result = Forcefield::load_non_bonded(&file_path);
        assert!(matches!(result, Err(ParamLoadError::Toml { .. })));
    }

    #[test]
    fn load_atom_types_csv_succeeds_with_valid_csv() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("types.csv");
        fs::write(
            &file_path,
            "residue,atom,ff_type,charge\nALA, CA, C, 0.07\n*,N,N,-0.47",
        )
        .unwrap();

        let types = Forcefield::load_atom_types_csv(&file_path).unwrap();
        let record = types.get(&("ALA".to_string(), "CA".to_string())).unwrap();
        assert_eq!(record.ff_type, "C");
        assert_eq!(record.charge, 0.07);
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn load_atom_types_csv_fails_for_malformed_csv() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("malformed.csv");
        fs::write(&file_path, "header1,header2\nval1").unwrap();
        let result = Forcefield::load_atom_types_csv(&file_path);
        assert!(matches!(result, Err(ParamLoadError::Csv { .. })));
    }

    #[test]
    fn atom_type_falls_back_to_wildcard_residue() {
        let dir = tempdir().unwrap();
        let non_bonded_path = dir.path().join("non_bonded.toml");
        fs::write(
            &non_bonded_path,
            "[globals]\ndielectric_constant = 1.0\n[vdw.C]\nradius = 3.8\nwell_depth = 0.1",
        )
        .unwrap();
        let types_path = dir.path().join("types.csv");
        fs::write(
            &types_path,
            "residue,atom,ff_type,charge\nGLY,CA,C,0.02\n*,CA,C,0.07",
        )
        .unwrap();

        let ff = Forcefield::load(&non_bonded_path, &types_path).unwrap();
        assert_eq!(ff.atom_type("GLY", "CA").unwrap().charge, 0.02);
        assert_eq!(ff.atom_type("LEU", "CA").unwrap().charge, 0.07);
        assert!(ff.atom_type("LEU", "CB").is_none());
        assert!(ff.vdw("C").is_some());
    }

    #[test]
    fn load_forcefield_fails_if_any_file_is_missing() {
        let dir = tempdir().unwrap();
        let non_bonded_path = dir.path().join("non_bonded.toml");
        let types_path = dir.path().join("types.csv");
        fs::write(
            &non_bonded_path,
            "[globals]\ndielectric_constant = 1.0\n[vdw]",
        )
        .unwrap();

        let result = Forcefield::load(&non_bonded_path, &types_path);
        assert!(matches!(result, Err(ParamLoadError::Csv { .. })));
    }
}
