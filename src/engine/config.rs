#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub min_column_gap: f32,
    pub max_columns: usize,
    pub margin_band_ratio: f32,
    pub divider_min_length_ratio: f32,
    pub divider_center_min_ratio: f32,
    pub divider_center_max_ratio: f32,
    pub divider_max_x_drift: f32,
    pub divider_epsilon: f32,
    pub outlier_trim_ratio: f32,
    pub histogram_bucket: f32,
    pub default_indent: f32,
    pub histogram_default_indent: f32,
    pub indent_window: (f32, f32),
    pub histogram_indent_window: (f32, f32),
    pub headword_tolerance: f32,
    pub continuation_tolerance: f32,
    pub promotion_tolerance: f32,
    pub inline_break_tolerance: f32,
    pub emphasis_size_delta: f32,
    pub recent_size_window: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_column_gap: 20.0,
            max_columns: 3,
            margin_band_ratio: 0.06,
            divider_min_length_ratio: 0.6,
            divider_center_min_ratio: 0.3,
            divider_center_max_ratio: 0.7,
            divider_max_x_drift: 1.0,
            divider_epsilon: 1.0,
            outlier_trim_ratio: 0.15,
            histogram_bucket: 2.0,
            default_indent: 20.0,
            histogram_default_indent: 22.0,
            indent_window: (8.0, 40.0),
            histogram_indent_window: (14.0, 40.0),
            headword_tolerance: 8.0,
            continuation_tolerance: 2.0,
            promotion_tolerance: 10.0,
            inline_break_tolerance: 12.0,
            emphasis_size_delta: 0.4,
            recent_size_window: 30,
        }
    }
}

impl ExtractionConfig {
    pub fn usable_band(&self, page_height: f32) -> (f32, f32) {
        let band = page_height * self.margin_band_ratio;
        (band, page_height - band)
    }
}
