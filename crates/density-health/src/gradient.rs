//! Gradient colorization on the viridis scale
//!
//! Each record's colour depends only on its aggregate density relative to
//! the batch minimum and maximum, so assignment order never matters.

use crate::record::HealthRecord;
use density_scene::{pack_argb, NodeId, RenderMaterial};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use tracing::debug;

/// Viridis lookup table; position `t` selects entry `floor(t * 256)`
pub const VIRIDIS: [[f64; 3]; 256] = [
    [0.267_004, 0.004_874, 0.329_415],
    [0.268_510, 0.009_605, 0.335_427],
    [0.269_944, 0.014_625, 0.341_379],
    [0.271_305, 0.019_942, 0.347_269],
    [0.272_594, 0.025_563, 0.353_093],
    [0.273_809, 0.031_497, 0.358_853],
    [0.274_952, 0.037_752, 0.364_543],
    [0.276_022, 0.044_167, 0.370_164],
    [0.277_018, 0.050_344, 0.375_715],
    [0.277_941, 0.056_324, 0.381_191],
    [0.278_791, 0.062_145, 0.386_592],
    [0.279_566, 0.067_836, 0.391_917],
    [0.280_267, 0.073_417, 0.397_163],
    [0.280_894, 0.078_907, 0.402_329],
    [0.281_446, 0.084_320, 0.407_414],
    [0.281_924, 0.089_666, 0.412_415],
    [0.282_327, 0.094_955, 0.417_331],
    [0.282_656, 0.100_196, 0.422_160],
    [0.282_910, 0.105_393, 0.426_902],
    [0.283_091, 0.110_553, 0.431_554],
    [0.283_197, 0.115_680, 0.436_115],
    [0.283_229, 0.120_777, 0.440_584],
    [0.283_187, 0.125_848, 0.444_960],
    [0.283_072, 0.130_895, 0.449_241],
    [0.282_884, 0.135_920, 0.453_427],
    [0.282_623, 0.140_926, 0.457_517],
    [0.282_290, 0.145_912, 0.461_510],
    [0.281_887, 0.150_881, 0.465_405],
    [0.281_412, 0.155_834, 0.469_201],
    [0.280_868, 0.160_771, 0.472_899],
    [0.280_255, 0.165_693, 0.476_498],
    [0.279_574, 0.170_599, 0.479_997],
    [0.278_826, 0.175_490, 0.483_397],
    [0.278_012, 0.180_367, 0.486_697],
    [0.277_134, 0.185_228, 0.489_898],
    [0.276_194, 0.190_074, 0.493_001],
    [0.275_191, 0.194_905, 0.496_005],
    [0.274_128, 0.199_721, 0.498_911],
    [0.273_006, 0.204_520, 0.501_721],
    [0.271_828, 0.209_303, 0.504_434],
    [0.270_595, 0.214_069, 0.507_052],
    [0.269_308, 0.218_818, 0.509_577],
    [0.267_968, 0.223_549, 0.512_008],
    [0.266_580, 0.228_262, 0.514_349],
    [0.265_145, 0.232_956, 0.516_599],
    [0.263_663, 0.237_631, 0.518_762],
    [0.262_138, 0.242_286, 0.520_837],
    [0.260_571, 0.246_922, 0.522_828],
    [0.258_965, 0.251_537, 0.524_736],
    [0.257_322, 0.256_130, 0.526_563],
    [0.255_645, 0.260_703, 0.528_312],
    [0.253_935, 0.265_254, 0.529_983],
    [0.252_194, 0.269_783, 0.531_579],
    [0.250_425, 0.274_290, 0.533_103],
    [0.248_629, 0.278_775, 0.534_556],
    [0.246_811, 0.283_237, 0.535_941],
    [0.244_972, 0.287_675, 0.537_260],
    [0.243_113, 0.292_092, 0.538_516],
    [0.241_237, 0.296_485, 0.539_709],
    [0.239_346, 0.300_855, 0.540_844],
    [0.237_441, 0.305_202, 0.541_921],
    [0.235_526, 0.309_527, 0.542_944],
    [0.233_603, 0.313_828, 0.543_914],
    [0.231_674, 0.318_106, 0.544_834],
    [0.229_739, 0.322_361, 0.545_706],
    [0.227_802, 0.326_594, 0.546_532],
    [0.225_863, 0.330_805, 0.547_314],
    [0.223_925, 0.334_994, 0.548_053],
    [0.221_989, 0.339_161, 0.548_752],
    [0.220_057, 0.343_307, 0.549_413],
    [0.218_130, 0.347_432, 0.550_038],
    [0.216_210, 0.351_535, 0.550_627],
    [0.214_298, 0.355_619, 0.551_184],
    [0.212_395, 0.359_683, 0.551_710],
    [0.210_503, 0.363_727, 0.552_206],
    [0.208_623, 0.367_752, 0.552_675],
    [0.206_756, 0.371_758, 0.553_117],
    [0.204_903, 0.375_746, 0.553_533],
    [0.203_063, 0.379_716, 0.553_925],
    [0.201_239, 0.383_670, 0.554_294],
    [0.199_430, 0.387_607, 0.554_642],
    [0.197_636, 0.391_528, 0.554_969],
    [0.195_860, 0.395_433, 0.555_276],
    [0.194_100, 0.399_323, 0.555_565],
    [0.192_357, 0.403_199, 0.555_836],
    [0.190_631, 0.407_061, 0.556_089],
    [0.188_923, 0.410_910, 0.556_326],
    [0.187_231, 0.414_746, 0.556_547],
    [0.185_556, 0.418_570, 0.556_753],
    [0.183_898, 0.422_383, 0.556_944],
    [0.182_256, 0.426_184, 0.557_120],
    [0.180_629, 0.429_975, 0.557_282],
    [0.179_019, 0.433_756, 0.557_430],
    [0.177_423, 0.437_527, 0.557_565],
    [0.175_841, 0.441_290, 0.557_685],
    [0.174_274, 0.445_044, 0.557_792],
    [0.172_719, 0.448_791, 0.557_885],
    [0.171_176, 0.452_530, 0.557_965],
    [0.169_646, 0.456_262, 0.558_030],
    [0.168_126, 0.459_988, 0.558_082],
    [0.166_617, 0.463_708, 0.558_119],
    [0.165_117, 0.467_423, 0.558_141],
    [0.163_625, 0.471_133, 0.558_148],
    [0.162_142, 0.474_838, 0.558_140],
    [0.160_665, 0.478_540, 0.558_115],
    [0.159_194, 0.482_237, 0.558_073],
    [0.157_729, 0.485_932, 0.558_013],
    [0.156_270, 0.489_624, 0.557_936],
    [0.154_815, 0.493_313, 0.557_840],
    [0.153_364, 0.497_000, 0.557_724],
    [0.151_918, 0.500_685, 0.557_587],
    [0.150_476, 0.504_369, 0.557_430],
    [0.149_039, 0.508_051, 0.557_250],
    [0.147_607, 0.511_733, 0.557_049],
    [0.146_180, 0.515_413, 0.556_823],
    [0.144_759, 0.519_093, 0.556_572],
    [0.143_343, 0.522_773, 0.556_295],
    [0.141_935, 0.526_453, 0.555_991],
    [0.140_536, 0.530_132, 0.555_659],
    [0.139_147, 0.533_812, 0.555_298],
    [0.137_770, 0.537_492, 0.554_906],
    [0.136_408, 0.541_173, 0.554_483],
    [0.135_066, 0.544_853, 0.554_029],
    [0.133_743, 0.548_535, 0.553_541],
    [0.132_444, 0.552_216, 0.553_018],
    [0.131_172, 0.555_899, 0.552_459],
    [0.129_933, 0.559_582, 0.551_864],
    [0.128_729, 0.563_265, 0.551_229],
    [0.127_568, 0.566_949, 0.550_556],
    [0.126_453, 0.570_633, 0.549_841],
    [0.125_394, 0.574_318, 0.549_086],
    [0.124_395, 0.578_002, 0.548_287],
    [0.123_463, 0.581_687, 0.547_445],
    [0.122_606, 0.585_371, 0.546_557],
    [0.121_831, 0.589_055, 0.545_623],
    [0.121_148, 0.592_739, 0.544_641],
    [0.120_565, 0.596_422, 0.543_611],
    [0.120_092, 0.600_104, 0.542_530],
    [0.119_738, 0.603_785, 0.541_400],
    [0.119_512, 0.607_464, 0.540_218],
    [0.119_423, 0.611_141, 0.538_982],
    [0.119_483, 0.614_817, 0.537_692],
    [0.119_699, 0.618_490, 0.536_347],
    [0.120_081, 0.622_161, 0.534_946],
    [0.120_638, 0.625_828, 0.533_488],
    [0.121_380, 0.629_492, 0.531_973],
    [0.122_312, 0.633_153, 0.530_398],
    [0.123_444, 0.636_809, 0.528_763],
    [0.124_780, 0.640_461, 0.527_068],
    [0.126_326, 0.644_107, 0.525_311],
    [0.128_087, 0.647_749, 0.523_491],
    [0.130_067, 0.651_384, 0.521_608],
    [0.132_268, 0.655_014, 0.519_661],
    [0.134_692, 0.658_636, 0.517_649],
    [0.137_339, 0.662_252, 0.515_571],
    [0.140_210, 0.665_859, 0.513_427],
    [0.143_303, 0.669_459, 0.511_215],
    [0.146_616, 0.673_050, 0.508_936],
    [0.150_148, 0.676_631, 0.506_589],
    [0.153_894, 0.680_203, 0.504_172],
    [0.157_851, 0.683_765, 0.501_686],
    [0.162_016, 0.687_316, 0.499_129],
    [0.166_383, 0.690_856, 0.496_502],
    [0.170_948, 0.694_384, 0.493_803],
    [0.175_707, 0.697_900, 0.491_033],
    [0.180_653, 0.701_402, 0.488_189],
    [0.185_783, 0.704_891, 0.485_273],
    [0.191_090, 0.708_366, 0.482_284],
    [0.196_571, 0.711_827, 0.479_221],
    [0.202_219, 0.715_272, 0.476_084],
    [0.208_030, 0.718_701, 0.472_873],
    [0.214_000, 0.722_114, 0.469_588],
    [0.220_124, 0.725_509, 0.466_226],
    [0.226_397, 0.728_888, 0.462_789],
    [0.232_815, 0.732_247, 0.459_277],
    [0.239_374, 0.735_588, 0.455_688],
    [0.246_070, 0.738_910, 0.452_024],
    [0.252_899, 0.742_211, 0.448_284],
    [0.259_857, 0.745_492, 0.444_467],
    [0.266_941, 0.748_751, 0.440_573],
    [0.274_149, 0.751_988, 0.436_601],
    [0.281_477, 0.755_203, 0.432_552],
    [0.288_921, 0.758_394, 0.428_426],
    [0.296_479, 0.761_561, 0.424_223],
    [0.304_148, 0.764_704, 0.419_943],
    [0.311_925, 0.767_822, 0.415_586],
    [0.319_809, 0.770_914, 0.411_152],
    [0.327_796, 0.773_980, 0.406_640],
    [0.335_885, 0.777_018, 0.402_049],
    [0.344_074, 0.780_029, 0.397_381],
    [0.352_360, 0.783_011, 0.392_636],
    [0.360_741, 0.785_964, 0.387_814],
    [0.369_214, 0.788_888, 0.382_914],
    [0.377_779, 0.791_781, 0.377_939],
    [0.386_433, 0.794_644, 0.372_886],
    [0.395_174, 0.797_475, 0.367_757],
    [0.404_001, 0.800_275, 0.362_552],
    [0.412_913, 0.803_041, 0.357_269],
    [0.421_908, 0.805_774, 0.351_910],
    [0.430_983, 0.808_473, 0.346_476],
    [0.440_137, 0.811_138, 0.340_967],
    [0.449_368, 0.813_768, 0.335_384],
    [0.458_674, 0.816_363, 0.329_727],
    [0.468_053, 0.818_921, 0.323_998],
    [0.477_504, 0.821_444, 0.318_195],
    [0.487_026, 0.823_929, 0.312_321],
    [0.496_615, 0.826_376, 0.306_377],
    [0.506_271, 0.828_786, 0.300_362],
    [0.515_992, 0.831_158, 0.294_279],
    [0.525_776, 0.833_491, 0.288_127],
    [0.535_621, 0.835_785, 0.281_908],
    [0.545_524, 0.838_039, 0.275_626],
    [0.555_484, 0.840_254, 0.269_281],
    [0.565_498, 0.842_430, 0.262_877],
    [0.575_563, 0.844_566, 0.256_415],
    [0.585_678, 0.846_661, 0.249_897],
    [0.595_839, 0.848_717, 0.243_329],
    [0.606_045, 0.850_733, 0.236_712],
    [0.616_293, 0.852_709, 0.230_052],
    [0.626_579, 0.854_645, 0.223_353],
    [0.636_902, 0.856_542, 0.216_620],
    [0.647_257, 0.858_400, 0.209_861],
    [0.657_642, 0.860_219, 0.203_082],
    [0.668_054, 0.861_999, 0.196_293],
    [0.678_489, 0.863_742, 0.189_503],
    [0.688_944, 0.865_448, 0.182_725],
    [0.699_415, 0.867_117, 0.175_971],
    [0.709_898, 0.868_751, 0.169_257],
    [0.720_391, 0.870_350, 0.162_603],
    [0.730_889, 0.871_916, 0.156_029],
    [0.741_388, 0.873_449, 0.149_561],
    [0.751_884, 0.874_951, 0.143_228],
    [0.762_373, 0.876_424, 0.137_064],
    [0.772_852, 0.877_868, 0.131_109],
    [0.783_315, 0.879_285, 0.125_405],
    [0.793_760, 0.880_678, 0.120_005],
    [0.804_182, 0.882_046, 0.114_965],
    [0.814_576, 0.883_393, 0.110_347],
    [0.824_940, 0.884_720, 0.106_217],
    [0.835_270, 0.886_029, 0.102_646],
    [0.845_561, 0.887_322, 0.099_702],
    [0.855_810, 0.888_601, 0.097_452],
    [0.866_013, 0.889_868, 0.095_953],
    [0.876_168, 0.891_125, 0.095_250],
    [0.886_271, 0.892_374, 0.095_374],
    [0.896_320, 0.893_616, 0.096_335],
    [0.906_311, 0.894_855, 0.098_125],
    [0.916_242, 0.896_091, 0.100_717],
    [0.926_106, 0.897_330, 0.104_071],
    [0.935_904, 0.898_570, 0.108_131],
    [0.945_636, 0.899_815, 0.112_838],
    [0.955_300, 0.901_065, 0.118_128],
    [0.964_894, 0.902_323, 0.123_941],
    [0.974_417, 0.903_590, 0.130_215],
    [0.983_868, 0.904_867, 0.136_897],
    [0.993_248, 0.906_157, 0.143_936],
];

/// Position used for every record when the batch has no spread
pub const DEGENERATE_POSITION: f64 = 0.5;

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red channel
    pub red: u8,
    /// Green channel
    pub green: u8,
    /// Blue channel
    pub blue: u8,
}

impl Rgb8 {
    /// Quantize unit-range channels, truncating
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn from_unit(channels: [f64; 3]) -> Self {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0) as u8;
        Self {
            red: byte(channels[0]),
            green: byte(channels[1]),
            blue: byte(channels[2]),
        }
    }

    /// `#rrggbb`
    #[must_use]
    pub fn to_hex(self) -> String {
        self.to_string()
    }

    /// Opaque ARGB packed as a signed 32-bit value
    #[inline]
    #[must_use]
    pub fn packed_argb(self) -> i32 {
        pack_argb(self.red, self.green, self.blue)
    }
}

impl Display for Rgb8 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Sample the viridis scale at `t`, clamped to [0, 1]
///
/// No interpolation: `t` picks one of the 256 table entries, `1.0`
/// landing on the last one.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
#[must_use]
pub fn viridis(t: f64) -> Rgb8 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let index = ((t * VIRIDIS.len() as f64) as usize).min(VIRIDIS.len() - 1);
    Rgb8::from_unit(VIRIDIS[index])
}

/// Linear position of `value` within `[min, max]`
///
/// Returns [`DEGENERATE_POSITION`] when the range is empty.
#[inline]
#[must_use]
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span > 0.0 {
        ((value - min) / span).clamp(0.0, 1.0)
    } else {
        DEGENERATE_POSITION
    }
}

/// Material assigned to a record with the given colour
#[must_use]
pub fn density_material(color: Rgb8) -> RenderMaterial {
    RenderMaterial::with_diffuse(format!("Density {color}"), color.packed_argb())
}

/// Colorization result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GradientOutput {
    /// Normalized position per record
    pub positions: IndexMap<NodeId, f64>,
    /// Record ids in colorization order
    pub order: Vec<NodeId>,
    /// Hex colour per record
    pub colors: IndexMap<NodeId, String>,
}

impl GradientOutput {
    /// Check if no record was coloured
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Colorize every record against the batch range
///
/// Sets each record's `material`. An empty batch is a no-op.
pub fn colorize(records: &mut IndexMap<NodeId, HealthRecord>) -> GradientOutput {
    let densities: Vec<f64> = records.values().map(HealthRecord::aggregate_density).collect();
    let Some(min) = densities.iter().copied().reduce(f64::min) else {
        return GradientOutput::default();
    };
    let max = densities.iter().copied().fold(min, f64::max);

    let mut output = GradientOutput::default();
    for (record, density) in records.values_mut().zip(densities) {
        let position = normalize(density, min, max);
        let color = viridis(position);
        record.material = Some(density_material(color));

        output.positions.insert(record.id.clone(), position);
        output.colors.insert(record.id.clone(), color.to_hex());
        output.order.push(record.id.clone());
    }
    debug!(records = output.order.len(), min, max, "records colorized");
    output
}
