//! Thermistor lookup table: resistance to temperature by linear interpolation.
//!
//! The table covers -30 °C to 400 °C in 1 °C steps. Resistance never increases
//! along the table; above 340 °C the sensor datasheet repeats whole-ohm values,
//! so a few neighbouring rows share a resistance. Lookups scan from the cold end
//! and an exact hit returns the first (coldest) matching row.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::config::{AdcConfig, ThermistorConfig};
use crate::error::{Result, SiriusError};

/// One table row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RtPoint {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Ohms.
    pub resistance: f64,
}

const fn rt(temperature: i32, resistance: u32) -> RtPoint {
    RtPoint {
        temperature: temperature as f64,
        resistance: resistance as f64,
    }
}

/// Datasheet rows for the stand's thermistors, coldest first.
pub const RT_TABLE: [RtPoint; 431] = [
    rt(-30, 1733200), rt(-29, 1630408), rt(-28, 1534477), rt(-27, 1444903),
    rt(-26, 1361220), rt(-25, 1283000), rt(-24, 1209327), rt(-23, 1140424),
    rt(-22, 1075949), rt(-21, 1015588), rt(-20, 959050), rt(-19, 906011),
    rt(-18, 856288), rt(-17, 809651), rt(-16, 765886), rt(-15, 724800),
    rt(-14, 685651), rt(-13, 648893), rt(-12, 614365), rt(-11, 581917),
    rt(-10, 551410), rt(-9, 522691), rt(-8, 495667), rt(-7, 470229),
    rt(-6, 446271), rt(-5, 423700), rt(-4, 402056), rt(-3, 381666),
    rt(-2, 362449), rt(-1, 344330), rt(0, 327240), rt(1, 311040),
    rt(2, 295751), rt(3, 281316), rt(4, 267682), rt(5, 254800),
    rt(6, 242583), rt(7, 231032), rt(8, 220108), rt(9, 209772),
    rt(10, 199990), rt(11, 190558), rt(12, 181632), rt(13, 173182),
    rt(14, 165180), rt(15, 157600), rt(16, 150425), rt(17, 143623),
    rt(18, 137173), rt(19, 131053), rt(20, 125245), rt(21, 119658),
    rt(22, 114356), rt(23, 109322), rt(24, 104542), rt(25, 100000),
    rt(26, 95819), rt(27, 91839), rt(28, 88049), rt(29, 84440),
    rt(30, 81000), rt(31, 77624), rt(32, 74409), rt(33, 71347),
    rt(34, 68430), rt(35, 65650), rt(36, 62984), rt(37, 60442),
    rt(38, 58018), rt(39, 55706), rt(40, 53500), rt(41, 51371),
    rt(42, 49339), rt(43, 47399), rt(44, 45548), rt(45, 43780),
    rt(46, 42056), rt(47, 40409), rt(48, 38837), rt(49, 37335),
    rt(50, 35899), rt(51, 34616), rt(52, 33386), rt(53, 32206),
    rt(54, 31075), rt(55, 29990), rt(56, 28905), rt(57, 27866),
    rt(58, 26870), rt(59, 25915), rt(60, 25000), rt(61, 24110),
    rt(62, 23257), rt(63, 22438), rt(64, 21653), rt(65, 20900),
    rt(66, 20174), rt(67, 19477), rt(68, 18808), rt(69, 18167),
    rt(70, 17550), rt(71, 16946), rt(72, 16366), rt(73, 15808),
    rt(74, 15274), rt(75, 14760), rt(76, 14281), rt(77, 13820),
    rt(78, 13377), rt(79, 12951), rt(80, 12540), rt(81, 12135),
    rt(82, 11745), rt(83, 11369), rt(84, 11008), rt(85, 10660),
    rt(86, 10324), rt(87, 10001), rt(88, 9689), rt(89, 9389),
    rt(90, 9100), rt(91, 8817), rt(92, 8544), rt(93, 8282),
    rt(94, 8028), rt(95, 7784), rt(96, 7553), rt(97, 7332),
    rt(98, 7117), rt(99, 6910), rt(100, 6710), rt(101, 6526),
    rt(102, 6349), rt(103, 6177), rt(104, 6011), rt(105, 5850),
    rt(106, 5683), rt(107, 5522), rt(108, 5366), rt(109, 5215),
    rt(110, 5070), rt(111, 4929), rt(112, 4793), rt(113, 4661),
    rt(114, 4533), rt(115, 4410), rt(116, 4290), rt(117, 4175),
    rt(118, 4063), rt(119, 3955), rt(120, 3850), rt(121, 3741),
    rt(122, 3635), rt(123, 3534), rt(124, 3435), rt(125, 3340),
    rt(126, 3255), rt(127, 3173), rt(128, 3093), rt(129, 3015),
    rt(130, 2940), rt(131, 2863), rt(132, 2789), rt(133, 2717),
    rt(134, 2648), rt(135, 2580), rt(136, 2514), rt(137, 2451),
    rt(138, 2389), rt(139, 2329), rt(140, 2270), rt(141, 2213),
    rt(142, 2157), rt(143, 2103), rt(144, 2051), rt(145, 2000),
    rt(146, 1951), rt(147, 1904), rt(148, 1858), rt(149, 1813),
    rt(150, 1770), rt(151, 1731), rt(152, 1694), rt(153, 1659),
    rt(154, 1623), rt(155, 1589), rt(156, 1552), rt(157, 1516),
    rt(158, 1481), rt(159, 1447), rt(160, 1414), rt(161, 1383),
    rt(162, 1349), rt(163, 1318), rt(164, 1288), rt(165, 1259),
    rt(166, 1230), rt(167, 1201), rt(168, 1174), rt(169, 1147),
    rt(170, 1122), rt(171, 1096), rt(172, 1070), rt(173, 1044),
    rt(174, 1020), rt(175, 997), rt(176, 976), rt(177, 955),
    rt(178, 935), rt(179, 915), rt(180, 896), rt(181, 875),
    rt(182, 855), rt(183, 835), rt(184, 816), rt(185, 797),
    rt(186, 781), rt(187, 765), rt(188, 749), rt(189, 734),
    rt(190, 719), rt(191, 703), rt(192, 687), rt(193, 672),
    rt(194, 657), rt(195, 643), rt(196, 630), rt(197, 618),
    rt(198, 605), rt(199, 593), rt(200, 582), rt(201, 571),
    rt(202, 561), rt(203, 552), rt(204, 542), rt(205, 533),
    rt(206, 523), rt(207, 512), rt(208, 502), rt(209, 492),
    rt(210, 483), rt(211, 473), rt(212, 464), rt(213, 455),
    rt(214, 446), rt(215, 437), rt(216, 428), rt(217, 420),
    rt(218, 412), rt(219, 404), rt(220, 396), rt(221, 388),
    rt(222, 381), rt(223, 374), rt(224, 367), rt(225, 360),
    rt(226, 353), rt(227, 347), rt(228, 340), rt(229, 334),
    rt(230, 328), rt(231, 322), rt(232, 316), rt(233, 310),
    rt(234, 305), rt(235, 299), rt(236, 294), rt(237, 288),
    rt(238, 283), rt(239, 278), rt(240, 273), rt(241, 269),
    rt(242, 264), rt(243, 259), rt(244, 255), rt(245, 251),
    rt(246, 246), rt(247, 242), rt(248, 238), rt(249, 234),
    rt(250, 230), rt(251, 226), rt(252, 222), rt(253, 218),
    rt(254, 215), rt(255, 211), rt(256, 207), rt(257, 204),
    rt(258, 201), rt(259, 197), rt(260, 194), rt(261, 191),
    rt(262, 188), rt(263, 185), rt(264, 182), rt(265, 179),
    rt(266, 176), rt(267, 173), rt(268, 171), rt(269, 168),
    rt(270, 166), rt(271, 163), rt(272, 160), rt(273, 158),
    rt(274, 155), rt(275, 153), rt(276, 151), rt(277, 148),
    rt(278, 146), rt(279, 143), rt(280, 141), rt(281, 139),
    rt(282, 137), rt(283, 135), rt(284, 133), rt(285, 131),
    rt(286, 129), rt(287, 127), rt(288, 125), rt(289, 123),
    rt(290, 122), rt(291, 120), rt(292, 118), rt(293, 116),
    rt(294, 115), rt(295, 113), rt(296, 112), rt(297, 110),
    rt(298, 108), rt(299, 107), rt(300, 106), rt(301, 104),
    rt(302, 103), rt(303, 101), rt(304, 100), rt(305, 98),
    rt(306, 97), rt(307, 95), rt(308, 94), rt(309, 92),
    rt(310, 91), rt(311, 90), rt(312, 88), rt(313, 87),
    rt(314, 86), rt(315, 85), rt(316, 83), rt(317, 82),
    rt(318, 81), rt(319, 80), rt(320, 79), rt(321, 77),
    rt(322, 76), rt(323, 75), rt(324, 74), rt(325, 73),
    rt(326, 72), rt(327, 71), rt(328, 70), rt(329, 69),
    rt(330, 68), rt(331, 67), rt(332, 66), rt(333, 65),
    rt(334, 64), rt(335, 63), rt(336, 62), rt(337, 61),
    rt(338, 60), rt(339, 59), rt(340, 58), rt(341, 57),
    rt(342, 56), rt(343, 56), rt(344, 55), rt(345, 54),
    rt(346, 53), rt(347, 52), rt(348, 51), rt(349, 51),
    rt(350, 50), rt(351, 49), rt(352, 48), rt(353, 48),
    rt(354, 47), rt(355, 46), rt(356, 45), rt(357, 45),
    rt(358, 44), rt(359, 43), rt(360, 43), rt(361, 42),
    rt(362, 41), rt(363, 41), rt(364, 40), rt(365, 40),
    rt(366, 39), rt(367, 38), rt(368, 38), rt(369, 37),
    rt(370, 37), rt(371, 36), rt(372, 36), rt(373, 35),
    rt(374, 35), rt(375, 34), rt(376, 34), rt(377, 33),
    rt(378, 33), rt(379, 32), rt(380, 32), rt(381, 31),
    rt(382, 31), rt(383, 30), rt(384, 30), rt(385, 29),
    rt(386, 29), rt(387, 28), rt(388, 28), rt(389, 27),
    rt(390, 27), rt(391, 26), rt(392, 26), rt(393, 26),
    rt(394, 25), rt(395, 25), rt(396, 24), rt(397, 24),
    rt(398, 24), rt(399, 23), rt(400, 23),
];

static STANDARD_TABLE: Lazy<ThermistorTable> = Lazy::new(|| ThermistorTable {
    points: RT_TABLE.to_vec(),
});

/// Process-wide table built from [`RT_TABLE`] on first use.
pub fn standard_table() -> &'static ThermistorTable {
    &STANDARD_TABLE
}

/// An ordered resistance/temperature table.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermistorTable {
    points: Vec<RtPoint>,
}

impl ThermistorTable {
    /// Build a table, checking that it has at least two rows and that
    /// resistance never increases from one row to the next.
    pub fn new(points: Vec<RtPoint>) -> Result<Self> {
        if points.len() < 2 {
            return Err(SiriusError::InvalidTable(format!(
                "need at least 2 rows, got {}",
                points.len()
            )));
        }
        if let Some(i) = points
            .windows(2)
            .position(|w| !(w[0].resistance >= w[1].resistance))
        {
            return Err(SiriusError::InvalidTable(format!(
                "resistance increases between rows {} and {}",
                i,
                i + 1
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[RtPoint] {
        &self.points
    }

    /// Resistance span covered by the table as `(min, max)`.
    pub fn resistance_range(&self) -> (f64, f64) {
        let first = self.points[0].resistance;
        let last = self.points[self.points.len() - 1].resistance;
        (last, first)
    }

    /// Temperature for a resistance, NaN outside the table.
    ///
    /// Scans from the cold end for the first pair with
    /// `R[i] >= resistance >= R[i + 1]` and interpolates linearly. A resistance
    /// equal to a table entry returns that entry's temperature exactly.
    pub fn temperature_from_resistance(&self, resistance: f64) -> f64 {
        for pair in self.points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if resistance <= lo.resistance && resistance >= hi.resistance {
                if resistance == lo.resistance {
                    return lo.temperature;
                }
                if resistance == hi.resistance {
                    return hi.temperature;
                }
                let slope = (hi.temperature - lo.temperature) / (hi.resistance - lo.resistance);
                return lo.temperature + slope * (resistance - lo.resistance);
            }
        }
        f64::NAN
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ADC front end
// ─────────────────────────────────────────────────────────────────────────────

/// A thermistor input: table plus the divider and converter it sits behind.
#[derive(Debug, Clone, Copy)]
pub struct Thermistor<'t> {
    table: &'t ThermistorTable,
    vref: f64,
    additive_factor: f64,
    control_resistance_ohms: f64,
}

impl Thermistor<'static> {
    /// Standard table with the stand's default front end.
    pub fn standard() -> Self {
        Self::from_config(standard_table(), &AdcConfig::default(), &ThermistorConfig::default())
    }
}

impl<'t> Thermistor<'t> {
    pub fn from_config(table: &'t ThermistorTable, adc: &AdcConfig, therm: &ThermistorConfig) -> Self {
        Self {
            table,
            vref: adc.vref,
            additive_factor: therm.additive_factor,
            control_resistance_ohms: therm.control_resistance_ohms,
        }
    }

    pub fn table(&self) -> &'t ThermistorTable {
        self.table
    }

    /// Counts to volts.
    pub fn voltage(&self, adc_value: f64) -> f64 {
        (adc_value / self.additive_factor) * self.vref
    }

    /// Counts to ohms, `None` when the voltage is not positive (open input).
    pub fn resistance_from_adc(&self, adc_value: f64) -> Option<f64> {
        let voltage = self.voltage(adc_value);
        if !(voltage > 0.0) {
            return None;
        }
        Some((self.vref / voltage) * self.control_resistance_ohms)
    }

    /// Counts to degrees Celsius; NaN for a non-positive voltage, a NaN
    /// sample, or a resistance the table does not cover.
    pub fn temperature_from_adc(&self, adc_value: f64) -> f64 {
        match self.resistance_from_adc(adc_value) {
            Some(r) => self.table.temperature_from_resistance(r),
            None => f64::NAN,
        }
    }
}

/// [`Thermistor::temperature_from_adc`] with the standard table and front end.
pub fn temperature_from_adc(adc_value: f64) -> f64 {
    Thermistor::standard().temperature_from_adc(adc_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_spans_datasheet_range() {
        let t = standard_table();
        assert_eq!(t.points().len(), 431);
        assert_eq!(t.points()[0], rt(-30, 1_733_200));
        assert_eq!(t.points()[430], rt(400, 23));
        assert_eq!(t.resistance_range(), (23.0, 1_733_200.0));
        assert!(ThermistorTable::new(RT_TABLE.to_vec()).is_ok());
    }

    #[test]
    fn rejects_increasing_resistance() {
        let err = ThermistorTable::new(vec![rt(0, 100), rt(1, 200)]);
        assert!(matches!(err, Err(SiriusError::InvalidTable(_))));
        assert!(ThermistorTable::new(vec![rt(0, 100)]).is_err());
    }

    #[test]
    fn repeated_resistance_resolves_to_coldest_row() {
        // rows 342 and 343 both read 56 ohm
        assert_eq!(standard_table().temperature_from_resistance(56.0), 342.0);
    }

    #[test]
    fn full_scale_reads_divider_resistance() {
        let th = Thermistor::standard();
        let r = th.resistance_from_adc(4096.0).unwrap();
        assert!((r - 10_000.0).abs() < 1e-9);
        assert_eq!(th.resistance_from_adc(0.0), None);
        assert_eq!(th.resistance_from_adc(-5.0), None);
        assert_eq!(th.resistance_from_adc(f64::NAN), None);
    }
}
