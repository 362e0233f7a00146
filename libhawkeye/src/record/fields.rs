use super::{FieldValue, Value};
use strum::{EnumCount, EnumIter, IntoStaticStr};

/// Declares every member a HAWKEYE point record can carry, together with the tag phrase that
/// binds a file field to it.
///
/// The order of the entries is the order in which tags are matched. A phrase that is contained
/// in another phrase ("Point Altitude" in "Point Altitude StdDev") must come after it.
macro_rules! point_fields {
    ($($(#[doc = $doc:literal])* $id:ident, $member:ident: $ty:ty => $tag:literal;)+) => {
        /// Identifies one member of a [`PointRecord`]
        #[allow(missing_docs)]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumCount, EnumIter, IntoStaticStr,
        )]
        pub enum FieldId {
            $($(#[doc = $doc])* $id,)+
        }

        /// A fully decoded HAWKEYE point record
        ///
        /// Holds one member per possible field. Only the members listed in the
        /// [`crate::Availability`] of the file a record came from carry data, all others are zero.
        #[allow(missing_docs)]
        #[derive(Debug, Clone, Copy, Default, PartialEq)]
        pub struct PointRecord {
            $($(#[doc = $doc])* pub $member: $ty,)+
            /// Absolute time of the record in seconds since the Unix epoch, derived from
            /// [`PointRecord::timestamp`]
            pub tv_sec: i64,
            /// Nanosecond part of the absolute time
            pub tv_nsec: i64,
        }

        /// Tag phrases in match order
        pub(crate) const TAG_PHRASES: [(&str, FieldId); FieldId::COUNT] = [$(($tag, FieldId::$id),)+];

        impl FieldId {
            /// Returns the canonical tag phrase of the field
            #[must_use]
            pub const fn tag(self) -> &'static str {
                match self {
                    $(Self::$id => $tag,)+
                }
            }

            /// Returns the name of the field
            #[must_use]
            pub fn as_str(self) -> &'static str {
                self.into()
            }
        }

        impl PointRecord {
            /// Returns the value of the member `field`
            #[must_use]
            pub fn get(&self, field: FieldId) -> Value {
                match field {
                    $(FieldId::$id => FieldValue::to_value(self.$member),)+
                }
            }

            /// Sets the member `field`, converting `value` to the member's type
            pub fn set(&mut self, field: FieldId, value: Value) {
                match field {
                    $(FieldId::$id => self.$member = <$ty as FieldValue>::from_value(value),)+
                }
            }
        }
    };
}

point_fields! {
    /// GPS time of the record, seconds of the GPS week
    Timestamp, timestamp: f64 => "Timestamp";
    /// Water surface latitude
    SurfaceLatitude, surface_latitude: f64 => "Surface Latitude";
    /// Water surface longitude
    SurfaceLongitude, surface_longitude: f64 => "Surface Longitude";
    SurfaceNorthingStdDev, surface_northing_stddev: f32 => "Surface Northing StdDev";
    SurfaceEastingStdDev, surface_easting_stddev: f32 => "Surface Easting StdDev";
    /// Interpolated surface altitude with the tide correction applied
    SurfaceAltitudeInterpolatedTideCorrected, surface_altitude_interpolated_tide_corrected: f32 => "Surface altitude interpolated tide corrected";
    InterpolatedSurfaceAltitude, interpolated_surface_altitude: f32 => "Interpolated Surface Altitude";
    SurfaceAltitudeStdDev, surface_altitude_stddev: f32 => "Surface Altitude StdDev";
    /// Water surface altitude
    SurfaceAltitude, surface_altitude: f32 => "Surface Altitude";
    /// Point latitude
    PointLatitude, point_latitude: f64 => "Point Latitude";
    /// Point longitude
    PointLongitude, point_longitude: f64 => "Point Longitude";
    PointNorthingStdDev, point_northing_stddev: f32 => "Point Northing StdDev";
    PointEastingStdDev, point_easting_stddev: f32 => "Point Easting StdDev";
    PointAltitudeStdDev, point_altitude_stddev: f32 => "Point Altitude StdDev";
    /// Point altitude
    PointAltitude, point_altitude: f32 => "Point Altitude";
    Azimuth, azimuth: f32 => "Azimuth";
    AirNadirAngle, air_nadir_angle: f32 => "Air Nadir Angle";
    WaterNadirAngle, water_nadir_angle: f32 => "Water Nadir Angle";
    /// Model used to compensate the slant range
    SlantRangeCompModel, slant_range_comp_model: u8 => "Slant Range Comp Model";
    SlantRange, slant_range: f32 => "Slant range";
    WaveHeight, wave_height: f32 => "Wave Height";
    WaterQualityCorrection, water_quality_correction: f32 => "Water Quality Correction";
    TidalCorrection, tidal_correction: f32 => "Tidal Correction";
    DepthAmplitude, depth_amplitude: f32 => "Depth Amplitude";
    DepthClass, depth_class: u8 => "Depth Class";
    DepthConfidence, depth_confidence: f32 => "Depth Confidence";
    /// Depth below the water surface
    Depth, depth: f32 => "Depth";
    /// Receiver pixel (0 to 3) the return was detected in
    PixelIndex, pixel_index: u8 => "Pixel Index";
    PixelPartition, pixel_partition: u8 => "Pixel Partition";
    ScannerAngleX, scanner_angle_x: f32 => "Scanner Angle X";
    ScannerAngleY, scanner_angle_y: f32 => "Scanner Angle Y";
    AircraftLatitude, aircraft_latitude: f64 => "Aircraft Latitude";
    AircraftLongitude, aircraft_longitude: f64 => "Aircraft Longitude";
    AircraftAltitudeStdDev, aircraft_altitude_stddev: f32 => "Aircraft Altitude StdDev";
    AircraftAltitude, aircraft_altitude: f32 => "Aircraft Altitude";
    AircraftRollStdDev, aircraft_roll_stddev: f32 => "Aircraft Roll StdDev";
    AircraftRoll, aircraft_roll: f32 => "Aircraft Roll";
    AircraftPitchStdDev, aircraft_pitch_stddev: f32 => "Aircraft Pitch StdDev";
    AircraftPitch, aircraft_pitch: f32 => "Aircraft Pitch";
    AircraftHeadingStdDev, aircraft_heading_stddev: f32 => "Aircraft Heading StdDev";
    AircraftHeading, aircraft_heading: f32 => "Aircraft Heading";
    AircraftNorthingStdDev, aircraft_northing_stddev: f32 => "Aircraft Northing StdDev";
    AircraftEastingStdDev, aircraft_easting_stddev: f32 => "Aircraft Easting StdDev";
    ExtractedWaveformAttributes, extracted_waveform_attributes: u32 => "Extracted Waveform Attributes";
    ReceiverDataUsed, receiver_data_used: u8 => "Receiver Data Used";
    ManualOutputScreeningFlags, manual_output_screening_flags: u32 => "Manual Output Screening Flags";
    WaveformPeakAmplitude, waveform_peak_amplitude: f32 => "Waveform Peak Amplitude";
    WaveformPeakClassification, waveform_peak_classification: i32 => "Waveform Peak Classification";
    WaveformPeakContrast, waveform_peak_contrast: f32 => "Waveform Peak Contrast";
    WaveformPeakDebugFlags, waveform_peak_debug_flags: u32 => "Waveform Peak Debug Flags";
    WaveformPeakAttributes, waveform_peak_attributes: u32 => "Waveform Peak Attributes";
    WaveformPeakJitter, waveform_peak_jitter: f32 => "Waveform Peak Jitter";
    WaveformPeakPosition, waveform_peak_position: f32 => "Waveform Peak Position";
    WaveformPeakPulsewidth, waveform_peak_pulsewidth: f32 => "Waveform Peak Pulsewidth";
    WaveformPeakSnr, waveform_peak_snr: f32 => "Waveform Peak SNR";
    WaveformPeakGain, waveform_peak_gain: u16 => "Waveform Peak Gain";
    ScanDirectionFlag, scan_direction_flag: u8 => "Scan Direction Flag";
    EdgeOfFlightline, edge_of_flightline: bool => "Edge of Flightline";
    ScanAngleRank, scan_angle_rank: i8 => "Scan Angle Rank";
    ScanPosition, scan_position: i16 => "Scan Position";
    SelectBottomCase, select_bottom_case: u8 => "SelectBottomCase";
    Elevation, elevation: f32 => "Elevation";
    ReturnNumber, return_number: u8 => "Return Number";
    NumberOfReturns, number_of_returns: u8 => "Number of Returns";
    IrPolarisationRatio, ir_polarisation_ratio: f32 => "IR polarisation ratio";
    IrAmplitude, ir_amplitude: f32 => "IR AMPLITUDE";
    SpatialQuality, spatial_quality: f32 => "Spatial Quality";
    KLidarAverage, k_lidar_average: f32 => "K Lidar Average";
    KLidarDeepMomentary, k_lidar_deep_momentary: f32 => "K Lidar Deep Momentary";
    KLidarShallowMomentary, k_lidar_shallow_momentary: f32 => "K Lidar Shallow Momentary";
    /// Diffuse attenuation coefficient
    KLidar, k_lidar: f32 => "K Lidar";
    RelativeReflectivity, relative_reflectivity: f32 => "Relative Reflectivity";
    AdjustedAmplitude, adjusted_amplitude: f32 => "Adjusted Amplitude";
    WaterTravelTime, water_travel_time: f32 => "Water Travel Time";
    AttenuationC, attenuation_c: f32 => "Attenuation c";
    AbsorptionA, absorption_a: f32 => "Absorption a";
    BackscatteringBb, backscattering_bb: f32 => "Backscattering Bb";
    ScatteringS, scattering_s: f32 => "Scattering s";
}

impl PointRecord {
    /// Iterates over the members listed in `availability`, in [`FieldId`] order
    pub fn available_fields<'a>(
        &'a self,
        availability: &'a crate::Availability,
    ) -> impl Iterator<Item = (FieldId, Value)> + 'a {
        availability.iter().map(|field| (field, self.get(field)))
    }
}
