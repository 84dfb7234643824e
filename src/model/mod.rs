mod data_layer;
mod kinetic_animation;
mod plot_list;
mod price_scale;
mod price_tick_marks;
mod range;
mod tick_marks;
mod time_data;
mod time_scale;

pub use data_layer::{DataLayer, DataUpdateResponse, SeriesChanges, SeriesDataRow, SeriesId};
pub use kinetic_animation::{AnimationClock, KineticAnimation, SystemClock};
pub use plot_list::{MinMax, MismatchDirection, PlotList};
pub use price_scale::{
    AutoScaleCandidate, AutoScaleInfo, AutoScaleMargins, AutoScaleSource, PriceAxisMark,
    PriceRange, PriceScale, PriceScaleMargins, PriceScaleMode, PriceScaleOptions, PriceScaleState,
    PriceScaleStateChange,
};
pub use price_tick_marks::{PriceMark, PriceTickSpanCalculator, price_tick_span, rebuild_price_marks};
pub use range::{LogicalRange, RangeImpl, StrictRange, TimePointIndex};
pub use tick_marks::{FormattedLabelsCache, TickMark, TickMarks};
pub use time_data::{
    BusinessDay, Color, PlotRow, PlotRowValueIndex, SeriesTime, TickMarkWeight, TimePoint,
    TimeScalePoint, UtcTimestamp, weight_by_time,
};
pub use time_scale::{TimeAxisMark, TimeLabelFormatter, TimeScale, TimeScaleOptions};
