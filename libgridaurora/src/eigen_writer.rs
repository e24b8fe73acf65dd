use hdf5::types::VarLenUnicode;
use hdf5::{Dataset, File, Group, H5Type};
use ndarray::{Array1, ArrayBase, Data, Dimension};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::constants::*;
use super::eigenprofile::{Eigenprofiles, ReactionRates};
use super::error::EigenWriterError;
use super::sim_time::to_unix_seconds;

/// Lower and upper bin edges, stored next to `/Ebins` so the bins can be rebuilt exactly
pub const EBINS_LOW_NAME: &str = "Ebins_low";
pub const EBINS_HIGH_NAME: &str = "Ebins_high";

/// A thin wrapper around an HDF5 file holding one eigenprofile run.
///
/// Layout:
///
/// ```text
/// sensorloc(dset) - unit, description
/// Ebins(dset), Ebins_low(dset), Ebins_high(dset) - unit
/// altitude(dset) - unit
/// ut1_unix(dset) - unit
/// diffnumflux(dset) - unit
/// ver
/// |---- eigenprofile(dset, gzip) - unit, size
/// |---- wavelength(dset) - unit
/// prod
/// |---- eigenprofile(dset, gzip) - unit, size
/// |---- reaction(dset, text) - description
/// loss
/// |---- eigenprofiles(dset, gzip) - unit, size
/// |---- reaction(dset, text) - description
/// energydeposition(dset, gzip) - unit, size
/// ```
///
/// The file handle is released when the writer is dropped, on success or error. A failure part
/// way through leaves the partially written file in place.
#[derive(Debug)]
pub struct EigenWriter {
    file_handle: File,
    path: PathBuf,
}

impl EigenWriter {
    /// Create the file at path, truncating any existing file.
    /// The parent directory must already exist.
    pub fn new(path: &Path) -> Result<Self, EigenWriterError> {
        let parent_exists = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.is_dir(),
            _ => true,
        };
        if !parent_exists {
            return Err(EigenWriterError::BadOutputPath(path.to_path_buf()));
        }
        let file_handle = File::create(path)?;
        Ok(Self {
            file_handle,
            path: path.to_path_buf(),
        })
    }

    /// Write the coordinate axes and provenance
    pub fn write_axes(
        &self,
        eig: &Eigenprofiles,
        sensorloc: [f64; 2],
    ) -> Result<(), EigenWriterError> {
        let root: &Group = &self.file_handle;
        let sensor = root
            .new_dataset_builder()
            .with_data(&Array1::from(sensorloc.to_vec()))
            .create(SENSORLOC_NAME)?;
        write_str_attr(&sensor, UNIT_ATTR, SENSORLOC_UNIT)?;
        write_str_attr(&sensor, DESCRIPTION_ATTR, SENSORLOC_DESCRIPTION)?;

        write_axis(root, EBINS_NAME, &eig.energy.centers(), EBINS_UNIT)?;
        write_axis(root, EBINS_LOW_NAME, &eig.energy.low, EBINS_UNIT)?;
        write_axis(root, EBINS_HIGH_NAME, &eig.energy.high, EBINS_UNIT)?;
        write_axis(root, ALTITUDE_NAME, &eig.altitude_km, ALTITUDE_UNIT)?;
        let ut1_unix = Array1::from_iter(eig.times.iter().map(to_unix_seconds));
        write_axis(root, UT1_UNIX_NAME, &ut1_unix, UT1_UNIX_UNIT)?;
        write_axis(root, DIFFNUMFLUX_NAME, &eig.diffnumflux, DIFFNUMFLUX_UNIT)?;
        Ok(())
    }

    /// Write the volume emission rate and its wavelength axis
    pub fn write_ver(&self, eig: &Eigenprofiles) -> Result<(), EigenWriterError> {
        let group = self.file_handle.create_group(VER_GROUP)?;
        let dset = write_compressed(&group, VER_EIGEN_NAME, &eig.ver)?;
        write_str_attr(&dset, UNIT_ATTR, VER_UNIT)?;
        write_str_attr(&dset, SIZE_ATTR, VER_SIZE)?;
        write_axis(
            &group,
            WAVELENGTH_NAME,
            &eig.wavelength_angstrom,
            WAVELENGTH_UNIT,
        )?;
        Ok(())
    }

    /// Write production or loss rates into `group_name/dset_name` with their reaction labels
    pub fn write_rates(
        &self,
        rates: &ReactionRates,
        group_name: &str,
        dset_name: &str,
    ) -> Result<(), EigenWriterError> {
        let group = self.file_handle.create_group(group_name)?;
        let dset = write_compressed(&group, dset_name, &rates.rates)?;
        write_str_attr(&dset, UNIT_ATTR, RATE_UNIT)?;
        write_str_attr(&dset, SIZE_ATTR, RATE_SIZE)?;

        let mut labels = Vec::with_capacity(rates.reactions.len());
        for reaction in rates.reactions.iter() {
            labels.push(
                VarLenUnicode::from_str(reaction)
                    .map_err(|_| EigenWriterError::BadText(reaction.clone()))?,
            );
        }
        let reaction_dset = group
            .new_dataset_builder()
            .with_data(&Array1::from(labels))
            .create(REACTION_NAME)?;
        write_str_attr(&reaction_dset, DESCRIPTION_ATTR, REACTION_DESCRIPTION)?;
        Ok(())
    }

    pub fn write_energy_deposition(&self, eig: &Eigenprofiles) -> Result<(), EigenWriterError> {
        let dset = write_compressed(
            &self.file_handle,
            ENERGY_DEPOSITION_NAME,
            &eig.energy_deposition,
        )?;
        write_str_attr(&dset, UNIT_ATTR, ENERGY_DEPOSITION_UNIT)?;
        write_str_attr(&dset, SIZE_ATTR, ENERGY_DEPOSITION_SIZE)?;
        Ok(())
    }

    /// Flush and close the file, consuming the writer
    pub fn close(self) -> Result<PathBuf, EigenWriterError> {
        self.file_handle.flush()?;
        drop(self.file_handle);
        let size = std::fs::metadata(&self.path)?.len();
        log::info!(
            "Wrote eigenprofiles to {} ({})",
            self.path.to_string_lossy(),
            human_bytes::human_bytes(size as f64)
        );
        Ok(self.path)
    }
}

/// Write one eigenprofile run to `path`. Without a path nothing is written and Ok(None) is
/// returned; the caller is expected to only plot the results.
pub fn write_eigenprofiles(
    path: Option<&Path>,
    eig: &Eigenprofiles,
    sensorloc: [f64; 2],
) -> Result<Option<PathBuf>, EigenWriterError> {
    let path = match path {
        Some(p) => p,
        None => return Ok(None),
    };
    eig.validate()?;
    log::info!("Writing eigenprofiles to {}", path.to_string_lossy());
    let writer = EigenWriter::new(path)?;
    writer.write_axes(eig, sensorloc)?;
    writer.write_ver(eig)?;
    writer.write_rates(&eig.prod, PROD_GROUP, PROD_EIGEN_NAME)?;
    writer.write_rates(&eig.loss, LOSS_GROUP, LOSS_EIGEN_NAME)?;
    writer.write_energy_deposition(eig)?;
    Ok(Some(writer.close()?))
}

fn write_str_attr(dset: &Dataset, key: &str, value: &str) -> Result<(), EigenWriterError> {
    let text = VarLenUnicode::from_str(value).map_err(|_| EigenWriterError::BadText(value.into()))?;
    dset.new_attr::<VarLenUnicode>()
        .create(key)?
        .write_scalar(&text)?;
    Ok(())
}

fn write_axis(
    group: &Group,
    name: &str,
    values: &Array1<f64>,
    unit: &str,
) -> Result<(), EigenWriterError> {
    let dset = group.new_dataset_builder().with_data(values).create(name)?;
    write_str_attr(&dset, UNIT_ATTR, unit)
}

/// Write a gzip compressed dataset chunked as a single block
fn write_compressed<T, S, D>(
    group: &Group,
    name: &str,
    data: &ArrayBase<S, D>,
) -> Result<Dataset, EigenWriterError>
where
    T: H5Type,
    S: Data<Elem = T>,
    D: Dimension,
{
    // zero length axes are not valid chunk sizes
    let chunk: Vec<usize> = data.shape().iter().map(|n| (*n).max(1)).collect();
    Ok(group
        .new_dataset_builder()
        .with_data(data)
        .chunk(chunk)
        .deflate(DEFLATE_LEVEL)
        .create(name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eigen_reader::read_eigenprofiles;
    use crate::eigenprofile::tests::sample_eigenprofiles;

    #[test]
    fn test_no_path_is_noop() {
        let eig = sample_eigenprofiles();
        assert!(write_eigenprofiles(None, &eig, [65.0, -148.0])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("eigen.h5");
        let eig = sample_eigenprofiles();
        assert!(matches!(
            write_eigenprofiles(Some(&path), &eig, [65.0, -148.0]),
            Err(EigenWriterError::BadOutputPath(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_inconsistent_tensors_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eigen.h5");
        let mut eig = sample_eigenprofiles();
        eig.altitude_km = Array1::zeros(7);
        assert!(matches!(
            write_eigenprofiles(Some(&path), &eig, [65.0, -148.0]),
            Err(EigenWriterError::EigenprofileError(_))
        ));

        let mut eig = sample_eigenprofiles();
        eig.energy.high = ndarray::array![100.0, 200.0];
        assert!(matches!(
            write_eigenprofiles(Some(&path), &eig, [65.0, -148.0]),
            Err(EigenWriterError::EigenprofileError(_))
        ));
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eigen.h5");
        let eig = sample_eigenprofiles();
        let written = write_eigenprofiles(Some(&path), &eig, [65.0, -148.0])
            .unwrap()
            .unwrap();
        assert_eq!(written, path);

        let (back, sensorloc) = read_eigenprofiles(&path).unwrap();
        assert_eq!(sensorloc, [65.0, -148.0]);
        assert_eq!(back.ver, eig.ver);
        assert_eq!(back.prod.rates, eig.prod.rates);
        assert_eq!(back.loss.rates, eig.loss.rates);
        assert_eq!(back.energy_deposition, eig.energy_deposition);
        assert_eq!(back, eig);
    }

    #[test]
    fn test_schema_and_units() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eigen.h5");
        let eig = sample_eigenprofiles();
        write_eigenprofiles(Some(&path), &eig, [65.0, -148.0]).unwrap();

        let file = File::open(&path).unwrap();
        let unit_of = |name: &str| -> String {
            file.dataset(name)
                .unwrap()
                .attr(UNIT_ATTR)
                .unwrap()
                .read_scalar::<VarLenUnicode>()
                .unwrap()
                .as_str()
                .to_string()
        };
        assert_eq!(unit_of("/sensorloc"), "degrees");
        assert_eq!(unit_of("/Ebins"), "eV");
        assert_eq!(unit_of("/altitude"), "km");
        assert_eq!(unit_of("/ut1_unix"), "seconds since 1970-01-01T00:00:00Z");
        assert_eq!(unit_of("/diffnumflux"), "cm^-2 s^-1 eV^-1");
        assert_eq!(unit_of("/ver/eigenprofile"), "photons cm^-3 sr^-1 s^-1");
        assert_eq!(unit_of("/ver/wavelength"), "Angstrom");
        assert_eq!(unit_of("/prod/eigenprofile"), "particle cm^-3 sr^-1 s^-1");
        assert_eq!(unit_of("/loss/eigenprofiles"), "particle cm^-3 sr^-1 s^-1");
        assert_eq!(unit_of("/energydeposition"), "ergs cm^-3 s^-1");

        let ver = file.dataset("/ver/eigenprofile").unwrap();
        assert_eq!(ver.shape(), vec![2, 3, 4, 5]);
        assert_eq!(
            ver.attr(SIZE_ATTR)
                .unwrap()
                .read_scalar::<VarLenUnicode>()
                .unwrap()
                .as_str(),
            "Ntime x NEnergy x Nalt x Nwavelength"
        );
        let ut1 = file.dataset("/ut1_unix").unwrap().read_1d::<f64>().unwrap();
        assert_eq!(ut1[0], 1_359_622_800.0);
        assert_eq!(ut1[1] - ut1[0], 3600.0);
        let reactions = file
            .dataset("/prod/reaction")
            .unwrap()
            .read_1d::<VarLenUnicode>()
            .unwrap();
        assert_eq!(reactions[0].as_str(), "O+(2P)");
    }
}
