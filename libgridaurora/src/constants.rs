// Eigenprofile container layout
pub const SENSORLOC_NAME: &str = "sensorloc";
pub const EBINS_NAME: &str = "Ebins";
pub const ALTITUDE_NAME: &str = "altitude";
pub const UT1_UNIX_NAME: &str = "ut1_unix";
pub const DIFFNUMFLUX_NAME: &str = "diffnumflux";
pub const VER_GROUP: &str = "ver";
pub const PROD_GROUP: &str = "prod";
pub const LOSS_GROUP: &str = "loss";
pub const VER_EIGEN_NAME: &str = "eigenprofile";
pub const PROD_EIGEN_NAME: &str = "eigenprofile";
// The loss dataset has always been plural; readers in the wild depend on it
pub const LOSS_EIGEN_NAME: &str = "eigenprofiles";
pub const WAVELENGTH_NAME: &str = "wavelength";
pub const REACTION_NAME: &str = "reaction";
pub const ENERGY_DEPOSITION_NAME: &str = "energydeposition";

// Attribute keys
pub const UNIT_ATTR: &str = "unit";
pub const SIZE_ATTR: &str = "size";
pub const DESCRIPTION_ATTR: &str = "description";

// Units
pub const SENSORLOC_UNIT: &str = "degrees";
pub const EBINS_UNIT: &str = "eV";
pub const ALTITUDE_UNIT: &str = "km";
pub const UT1_UNIX_UNIT: &str = "seconds since 1970-01-01T00:00:00Z";
pub const DIFFNUMFLUX_UNIT: &str = "cm^-2 s^-1 eV^-1";
pub const VER_UNIT: &str = "photons cm^-3 sr^-1 s^-1";
pub const RATE_UNIT: &str = "particle cm^-3 sr^-1 s^-1";
pub const WAVELENGTH_UNIT: &str = "Angstrom";
pub const ENERGY_DEPOSITION_UNIT: &str = "ergs cm^-3 s^-1";

// Size descriptors
pub const VER_SIZE: &str = "Ntime x NEnergy x Nalt x Nwavelength";
pub const RATE_SIZE: &str = "Ntime x NEnergy x Nalt x Nreaction";
pub const ENERGY_DEPOSITION_SIZE: &str = "Ntime x Nalt x NEnergies";

pub const SENSORLOC_DESCRIPTION: &str = "geographic coordinates";
pub const REACTION_DESCRIPTION: &str = "reaction species state";

/// gzip level used for every eigenprofile tensor
pub const DEFLATE_LEVEL: u8 = 4;

pub const ANGSTROM_PER_NM: f64 = 10.0;

// Transmission series names
pub const SYS_SERIES: &str = "sys";
pub const SYS_NO_FILTER_SERIES: &str = "sysNObg3";
pub const ATM_SERIES: &str = "atm";
pub const FILTER_SERIES: &str = "filter";
pub const WINDOW_SERIES: &str = "window";
pub const QE_SERIES: &str = "qe";

/// The historical comparison pair and the label of their product
pub const RAYLEIGH_FILTER_NAMES: [&str; 2] = ["Hoya V-10", "Wratten 21"];
pub const RAYLEIGH_LABEL: &str = "Rayleigh 1924";

/// Default upper limit of the extrapolated energy grid (100 MeV)
pub const DEFAULT_MAX_ENERGY_EV: f64 = 100e6;
