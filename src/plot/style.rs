use plotters::style::RGBColor;

/// Stream name fragment identifying Tobii eye trackers
pub const EYE_TRACKER_VENDOR: &str = "Tobii";

pub const PINK: RGBColor = RGBColor(255, 192, 203);
pub const PURPLE: RGBColor = RGBColor(128, 0, 128);
pub const GREEN: RGBColor = RGBColor(0, 128, 0);
pub const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
pub const BLUE: RGBColor = RGBColor(0, 0, 255);
pub const LIGHT_BLUE: RGBColor = RGBColor(173, 216, 230);
pub const MARKER_RED: RGBColor = RGBColor(255, 0, 0);
pub const TRACE_BLACK: RGBColor = RGBColor(0, 0, 0);

/// Eye tracker channels worth plotting, in drawing order, with their colours
pub const EYE_TRACKER_CHANNELS: [(&str, RGBColor); 6] = [
    ("left_pupil_diameter", PINK),
    ("right_pupil_diameter", PURPLE),
    ("left_gaze_point_on_display_area_0", GREEN),
    ("left_gaze_point_on_display_area_1", LIGHT_GREEN),
    ("right_gaze_point_on_display_area_0", BLUE),
    ("right_gaze_point_on_display_area_1", LIGHT_BLUE),
];

pub fn is_eye_tracker(stream_name: &str) -> bool {
    stream_name.contains(EYE_TRACKER_VENDOR)
}

pub fn eye_tracker_colour(channel: &str) -> Option<RGBColor> {
    EYE_TRACKER_CHANNELS
        .iter()
        .find(|(name, _)| *name == channel)
        .map(|&(_, colour)| colour)
}

/// Figure geometry in pixels
#[derive(Debug, Clone, Copy)]
pub struct FigureSize {
    pub width: u32,
    pub height: u32,
}

/// Combined figure: full width, 400 px per stream
pub fn combined_figure_size(streams: usize) -> FigureSize {
    FigureSize {
        width: 1500,
        height: 400 * streams.max(1) as u32,
    }
}

pub const SINGLE_FIGURE_SIZE: FigureSize = FigureSize {
    width: 1200,
    height: 600,
};
