use iced::{
    Color, Element,
    Length::Fill,
    widget::{button, column, container, row, scrollable, text},
};

use crate::gui::state::{LogSource, RunLog};

const STDERR_COLOR: Color = Color::from_rgb(0.75, 0.2, 0.2);
const APP_COLOR: Color = Color::from_rgb(0.0, 0.2, 0.4);

/// Current path (or placeholder) next to the button that changes it.
pub fn picker_row<'a, Message>(
    shown: String,
    label: &'a str,
    on_press: Message,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    row![
        container(text(shown)).width(Fill),
        button(text(label).size(14)).on_press(on_press),
    ]
    .spacing(12)
    .align_y(iced::Alignment::Center)
    .into()
}

pub fn log_view<'a, Message>(log: &'a RunLog) -> Element<'a, Message>
where
    Message: 'a,
{
    let lines = log.iter().map(|line| {
        let body = text(line.rendered());
        let label = match line.source {
            LogSource::Stdout => body,
            LogSource::Stderr => body.color(STDERR_COLOR),
            LogSource::App => body.color(APP_COLOR),
        };
        Element::from(label.size(13))
    });

    container(scrollable(column(lines).spacing(2)).anchor_bottom().width(Fill))
        .padding(8)
        .height(Fill)
        .style(container::bordered_box)
        .into()
}
