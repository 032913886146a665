use crate::language::errors::ConcretizeError;
use miette::{GraphicalReportHandler, GraphicalTheme, Report};

/// Renders an error with its code, labels and help, without colour.
pub fn render_error(error: &ConcretizeError) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut rendered = String::new();
    if handler.render_report(&mut rendered, error).is_err() {
        return error.to_string();
    }
    rendered
}

pub fn report_error(error: &ConcretizeError) {
    eprintln!("{:?}", Report::new(error.clone()));
}
