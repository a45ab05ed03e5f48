pub(crate) mod calibration;
pub(crate) mod params;
