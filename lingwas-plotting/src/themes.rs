//! Color themes for the GWAS plots.

use plotters::style::RGBColor;

/// Colors used by the Manhattan and QQ renderers.
#[derive(Clone, Debug)]
pub struct Theme {
    pub background: RGBColor,
    pub text: RGBColor,
    pub axis: RGBColor,
    /// Genome-wide significance line.
    pub significance_line: RGBColor,
    /// Suggestive significance line.
    pub suggestive_line: RGBColor,
    /// QQ diagonal reference line.
    pub reference_line: RGBColor,
    /// Alternating chromosome colors, cycled by chromosome parity.
    pub chromosome_colors: [RGBColor; 2],
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Grayscale points with blue/red threshold lines, the layout of
    /// the standard PLINK-era Manhattan plot.
    pub fn classic() -> Self {
        Self {
            background: RGBColor(255, 255, 255),
            text: RGBColor(0, 0, 0),
            axis: RGBColor(90, 90, 90),
            significance_line: RGBColor(214, 39, 40),
            suggestive_line: RGBColor(31, 119, 180),
            reference_line: RGBColor(214, 39, 40),
            chromosome_colors: [RGBColor(40, 40, 40), RGBColor(130, 130, 130)],
        }
    }

    /// Blue/orange alternating chromosomes.
    pub fn contrast() -> Self {
        Self {
            background: RGBColor(255, 255, 255),
            text: RGBColor(0, 0, 0),
            axis: RGBColor(90, 90, 90),
            significance_line: RGBColor(178, 34, 34),
            suggestive_line: RGBColor(105, 105, 105),
            reference_line: RGBColor(178, 34, 34),
            chromosome_colors: [RGBColor(31, 119, 180), RGBColor(255, 127, 14)],
        }
    }
}
