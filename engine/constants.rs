// ========================================================================================
//
//                     Transcribed BCRAT model tables (Gail model 2)
//
// ========================================================================================
//
// Values are copied from the published model tables and must stay bit-for-bit identical.
// Several races share a table with another race; those reuse the same constant rather
// than recomputing it. Rates given per 100,000 woman-years are scaled by `PER_100K` when
// the repository is assembled.

/// Lower edges of the 14 five-year age bands plus the closing edge at 90.
pub(crate) const AGE_BOUNDARIES: [f64; 15] = [
    20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0,
];

pub(crate) const PER_100K: f64 = 0.00001;

// --- Competing (non-breast-cancer) mortality ---------------------------------------------

/// White/Other, BCPT model, per 100,000.
pub(crate) const MORTALITY_WHITE_PER_100K: [f64; 14] = [
    49.3, 53.1, 62.5, 82.5, 130.7, 218.1, 365.5, 585.2, 943.9, 1502.8, 2383.9, 3883.2, 6682.8,
    14490.8,
];

/// African American, updated 11/29/2007.
pub(crate) const MORTALITY_AFRICAN_AMERICAN: [f64; 14] = [
    0.00074354, 0.00101698, 0.00145937, 0.00215933, 0.00315077, 0.00448779, 0.00632281,
    0.00963037, 0.01471818, 0.02116304, 0.03266035, 0.04564087, 0.06835185, 0.13271262,
];

/// Hispanic, STAR model, per 100,000.
pub(crate) const MORTALITY_HISPANIC_PER_100K: [f64; 14] = [
    43.7, 53.3, 70.0, 89.7, 116.3, 170.2, 264.6, 421.6, 696.0, 1086.7, 1685.8, 2515.6, 4186.6,
    8947.6,
];

/// Average White/Other woman, per 100,000.
pub(crate) const MORTALITY_WHITE_AVERAGE_PER_100K: [f64; 14] = [
    44.12, 52.54, 67.46, 90.92, 125.34, 195.70, 329.84, 546.22, 910.35, 1418.54, 2259.35,
    3611.46, 6136.26, 14206.63,
];

/// Chinese, SEER18 1998-2002.
pub(crate) const MORTALITY_CHINESE: [f64; 14] = [
    0.000210649076,
    0.000192644865,
    0.000244435215,
    0.000317895949,
    0.000473261994,
    0.000800271380,
    0.001217480226,
    0.002099836508,
    0.003436889186,
    0.006097405623,
    0.010664526765,
    0.020148678452,
    0.037990796590,
    0.098333900733,
];

/// Japanese, SEER18 1998-2002.
pub(crate) const MORTALITY_JAPANESE: [f64; 14] = [
    0.000173593803,
    0.000295805882,
    0.000228322534,
    0.000363242389,
    0.000590633044,
    0.001086079485,
    0.001859999966,
    0.003216600974,
    0.004719402141,
    0.008535331402,
    0.012433511681,
    0.020230197885,
    0.037725498348,
    0.106149118663,
];

/// Filipino, SEER18 1998-2002.
pub(crate) const MORTALITY_FILIPINO: [f64; 14] = [
    0.000229120979,
    0.000262988494,
    0.000314844090,
    0.000394471908,
    0.000647622610,
    0.001170202327,
    0.001809380379,
    0.002614170568,
    0.004483330681,
    0.007393665092,
    0.012233059675,
    0.021127058106,
    0.037936954809,
    0.085138518334,
];

/// Hawaiian, SEER18 1998-2002.
pub(crate) const MORTALITY_HAWAIIAN: [f64; 14] = [
    0.000563507269,
    0.000369640217,
    0.001019912579,
    0.001234013911,
    0.002098344078,
    0.002982934175,
    0.005402445702,
    0.009591474245,
    0.016315472607,
    0.020152229069,
    0.027354838710,
    0.050446998723,
    0.072262026612,
    0.145844504021,
];

/// Other Pacific Islander, SEER18 1998-2002.
pub(crate) const MORTALITY_OTHER_PACIFIC_ISLANDER: [f64; 14] = [
    0.000465500812,
    0.000600466920,
    0.000851057138,
    0.001478265376,
    0.001931486788,
    0.003866623959,
    0.004924932309,
    0.008177071806,
    0.008638202890,
    0.018974658371,
    0.029257567105,
    0.038408980974,
    0.052869579345,
    0.074745721133,
];

/// Other Asian, SEER18 1998-2002.
pub(crate) const MORTALITY_OTHER_ASIAN: [f64; 14] = [
    0.000212632332,
    0.000242170741,
    0.000301552711,
    0.000369053354,
    0.000543002943,
    0.000893862331,
    0.001515172239,
    0.002574669551,
    0.004324370426,
    0.007419621918,
    0.013251765130,
    0.022291427490,
    0.041746550635,
    0.087485802065,
];

// --- Composite breast cancer incidence ---------------------------------------------------

/// White/Other, BCPT model (SEER 1983-87), per 100,000.
pub(crate) const INCIDENCE_WHITE_PER_100K: [f64; 14] = [
    1.0, 7.6, 26.6, 66.1, 126.5, 186.6, 221.1, 272.1, 334.8, 392.3, 417.8, 443.9, 442.1, 410.9,
];

/// African American, SEER11 1994-98, updated 11/29/2007.
pub(crate) const INCIDENCE_AFRICAN_AMERICAN: [f64; 14] = [
    0.00002696, 0.00011295, 0.00031094, 0.00067639, 0.00119444, 0.00187394, 0.00241504,
    0.00291112, 0.00310127, 0.00366560, 0.00393132, 0.00408951, 0.00396793, 0.00363712,
];

/// Hispanic, STAR model, per 100,000.
pub(crate) const INCIDENCE_HISPANIC_PER_100K: [f64; 14] = [
    2.00, 7.10, 19.70, 43.80, 81.10, 130.70, 157.40, 185.70, 215.10, 251.20, 284.60, 275.70,
    252.30, 203.90,
];

/// Average White/Other woman, per 100,000.
pub(crate) const INCIDENCE_WHITE_AVERAGE_PER_100K: [f64; 14] = [
    1.22, 7.41, 22.97, 56.49, 116.45, 195.25, 261.54, 302.79, 367.57, 420.29, 473.08, 494.25,
    479.76, 401.06,
];

/// Chinese, SEER18 1998-2002.
pub(crate) const INCIDENCE_CHINESE: [f64; 14] = [
    0.000004059636,
    0.000045944465,
    0.000188279352,
    0.000492930493,
    0.000913603501,
    0.001471537353,
    0.001421275482,
    0.001970946494,
    0.001674745804,
    0.001821581075,
    0.001834477198,
    0.001919911972,
    0.002233371071,
    0.002247315779,
];

/// Japanese, SEER18 1998-2002.
pub(crate) const INCIDENCE_JAPANESE: [f64; 14] = [
    0.000000000001,
    0.000099483924,
    0.000287041681,
    0.000545285759,
    0.001152211095,
    0.001859245108,
    0.002606291272,
    0.003221751682,
    0.004006961859,
    0.003521715275,
    0.003593038294,
    0.003589303081,
    0.003538507159,
    0.002051572909,
];

/// Filipino, SEER18 1998-2002.
pub(crate) const INCIDENCE_FILIPINO: [f64; 14] = [
    0.000007500161,
    0.000081073945,
    0.000227492565,
    0.000549786433,
    0.001129400541,
    0.001813873795,
    0.002223665639,
    0.002680309266,
    0.002891219230,
    0.002534421279,
    0.002457159409,
    0.002286616920,
    0.001814802825,
    0.001750879130,
];

/// Hawaiian, SEER18 1998-2002.
pub(crate) const INCIDENCE_HAWAIIAN: [f64; 14] = [
    0.000045080582,
    0.000098570724,
    0.000339970860,
    0.000852591429,
    0.001668562761,
    0.002552703284,
    0.003321774046,
    0.005373001776,
    0.005237808549,
    0.005581732512,
    0.005677419355,
    0.006513409962,
    0.003889457523,
    0.002949061662,
];

/// Other Pacific Islander, SEER18 1998-2002.
pub(crate) const INCIDENCE_OTHER_PACIFIC_ISLANDER: [f64; 14] = [
    0.000000000001,
    0.000071525212,
    0.000288799028,
    0.000602250698,
    0.000755579402,
    0.000766406354,
    0.001893124938,
    0.002365580107,
    0.002843933070,
    0.002920921732,
    0.002330395655,
    0.002036291235,
    0.001482683983,
    0.001012248203,
];

/// Other Asian, SEER18 1998-2002.
pub(crate) const INCIDENCE_OTHER_ASIAN: [f64; 14] = [
    0.000012355409,
    0.000059526456,
    0.000184320831,
    0.000454677273,
    0.000791265338,
    0.001048462801,
    0.001372467817,
    0.001495473711,
    0.001646746198,
    0.001478363563,
    0.001216010125,
    0.001067663700,
    0.001376104012,
    0.000661576644,
];

// --- Relative-risk regression coefficients -----------------------------------------------
//
// Layout: intercept, age >= 50, menarche, number of biopsies, age at first live birth,
// number of affected first-degree relatives, biopsies x age >= 50,
// first live birth x relatives.

/// White/Other (BCDDP). Also used for Hispanic and the average White/Hispanic woman.
pub(crate) const COEFFICIENTS_WHITE: [f64; 8] = [
    -0.7494824600,
    0.0108080720,
    0.0940103059,
    0.5292641686,
    0.2186262218,
    0.9583027845,
    -0.2880424830,
    -0.1908113865,
];

/// African American (CARE).
pub(crate) const COEFFICIENTS_AFRICAN_AMERICAN: [f64; 8] = [
    -0.3457169653,
    0.0334703319,
    0.2672530336,
    0.1822121131,
    0.0000000000,
    0.4757242578,
    -0.1119411682,
    0.0000000000,
];

/// Asian-American (AABCS), shared by all six Asian and Pacific Islander subgroups.
pub(crate) const COEFFICIENTS_ASIAN: [f64; 8] = [
    0.0,
    0.0,
    0.07499257592975,
    0.55263612260619,
    0.27638268294593,
    0.79185633720481,
    0.0,
    0.0,
];

// --- One minus attributable risk, (below 50, 50 and over) --------------------------------

pub(crate) const ATTRIBUTABLE_WHITE: (f64, f64) = (0.5788413, 0.5788413);

/// African American, updated 12/19/2007.
pub(crate) const ATTRIBUTABLE_AFRICAN_AMERICAN: (f64, f64) = (0.72949880, 0.74397137);

pub(crate) const ATTRIBUTABLE_HISPANIC: (f64, f64) = (0.5788413, 0.5788413);

/// The average woman carries no covariate-explained excess.
pub(crate) const ATTRIBUTABLE_AVERAGE: (f64, f64) = (1.0, 1.0);

pub(crate) const ATTRIBUTABLE_ASIAN: (f64, f64) = (0.47519806426735, 0.50316401683903);

/// Population-level pair shared by the Asian subgroups when computing average risk.
pub(crate) const ATTRIBUTABLE_ASIAN_POPULATION: (f64, f64) = (1.0, 1.0);
