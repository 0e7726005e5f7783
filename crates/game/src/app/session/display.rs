use engine::Vec2;

use super::location::Location;

/// What the session asks the display layer to show. The inventory bar and
/// menu board are always sent whole.
pub(crate) trait DisplaySink {
    fn on_dialogue_change(&mut self, text: &str, position: Vec2, visible: bool);
    fn on_inventory_change(&mut self, items: &[String]);
    fn on_location_change(&mut self, location: Location);
    fn on_countdown_change(&mut self, remaining: Option<u32>);
    fn on_announcement_change(&mut self, text: Option<&str>, position: Vec2);
    fn on_menu_board_change(&mut self, lines: &[String]);
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DisplayCommand {
    Dialogue {
        text: String,
        position: Vec2,
        visible: bool,
    },
    Inventory(Vec<String>),
    Location(Location),
    Countdown(Option<u32>),
    Announcement {
        text: Option<String>,
        position: Vec2,
    },
    MenuBoard(Vec<String>),
}

/// Commands raised during a tick, delivered in order by `flush`.
#[derive(Debug, Default)]
pub(crate) struct DisplayQueue {
    commands: Vec<DisplayCommand>,
}

impl DisplayQueue {
    pub(crate) fn enqueue(&mut self, command: DisplayCommand) {
        self.commands.push(command);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.commands.len()
    }

    pub(crate) fn flush(&mut self, sink: &mut impl DisplaySink) {
        for command in self.commands.drain(..) {
            match command {
                DisplayCommand::Dialogue {
                    text,
                    position,
                    visible,
                } => sink.on_dialogue_change(&text, position, visible),
                DisplayCommand::Inventory(items) => sink.on_inventory_change(&items),
                DisplayCommand::Location(location) => sink.on_location_change(location),
                DisplayCommand::Countdown(remaining) => sink.on_countdown_change(remaining),
                DisplayCommand::Announcement { text, position } => {
                    sink.on_announcement_change(text.as_deref(), position)
                }
                DisplayCommand::MenuBoard(lines) => sink.on_menu_board_change(&lines),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<String>);

    impl DisplaySink for Log {
        fn on_dialogue_change(&mut self, text: &str, _position: Vec2, visible: bool) {
            self.0.push(format!("dialogue:{text}:{visible}"));
        }
        fn on_inventory_change(&mut self, items: &[String]) {
            self.0.push(format!("inventory:{}", items.join(",")));
        }
        fn on_location_change(&mut self, location: Location) {
            self.0.push(format!("location:{location}"));
        }
        fn on_countdown_change(&mut self, remaining: Option<u32>) {
            self.0.push(format!("countdown:{remaining:?}"));
        }
        fn on_announcement_change(&mut self, text: Option<&str>, _position: Vec2) {
            self.0.push(format!("announcement:{text:?}"));
        }
        fn on_menu_board_change(&mut self, lines: &[String]) {
            self.0.push(format!("menu:{}", lines.len()));
        }
    }

    #[test]
    fn flush_delivers_in_order_and_empties_queue() {
        let mut queue = DisplayQueue::default();
        queue.enqueue(DisplayCommand::Countdown(Some(5)));
        queue.enqueue(DisplayCommand::Inventory(vec!["fries".to_string()]));
        queue.enqueue(DisplayCommand::Location(Location::Cafeteria));
        assert_eq!(queue.len(), 3);

        let mut log = Log::default();
        queue.flush(&mut log);
        assert_eq!(
            log.0,
            vec!["countdown:Some(5)", "inventory:fries", "location:cafeteria"]
        );
        assert_eq!(queue.len(), 0);
    }
}
