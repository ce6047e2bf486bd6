/// Which attachment, if any, the lightbox is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageViewer {
    open: Option<usize>,
}

impl ImageViewer {
    pub fn current(&self) -> Option<usize> {
        self.open
    }

    pub fn open(&mut self, index: usize, len: usize) {
        if index < len {
            self.open = Some(index);
        }
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn next(&mut self, len: usize) {
        if let Some(index) = self.open {
            if len > 1 {
                self.open = Some((index + 1) % len);
            }
        }
    }

    pub fn prev(&mut self, len: usize) {
        if let Some(index) = self.open {
            if len > 1 {
                self.open = Some((index + len - 1) % len);
            }
        }
    }

    /// Keeps the viewed index valid after the attachment at `removed` is gone
    /// and `remaining` attachments are left.
    pub fn on_removed(&mut self, removed: usize, remaining: usize) {
        let Some(index) = self.open else {
            return;
        };
        if remaining == 0 {
            self.open = None;
        } else if index > removed {
            self.open = Some(index - 1);
        } else if index >= remaining {
            self.open = Some(remaining - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ImageViewer;

    #[test]
    fn next_wraps_past_last_attachment() {
        let mut viewer = ImageViewer::default();
        viewer.open(2, 4);
        viewer.next(4);
        assert_eq!(viewer.current(), Some(3));
        viewer.next(4);
        assert_eq!(viewer.current(), Some(0));
    }

    #[test]
    fn prev_wraps_before_first_attachment() {
        let mut viewer = ImageViewer::default();
        viewer.open(0, 3);
        viewer.prev(3);
        assert_eq!(viewer.current(), Some(2));
    }

    #[test]
    fn single_attachment_does_not_navigate() {
        let mut viewer = ImageViewer::default();
        viewer.open(0, 1);
        viewer.next(1);
        viewer.prev(1);
        assert_eq!(viewer.current(), Some(0));
    }

    #[test]
    fn open_out_of_range_is_ignored() {
        let mut viewer = ImageViewer::default();
        viewer.open(4, 4);
        assert_eq!(viewer.current(), None);
    }

    #[test]
    fn removal_clamps_and_shifts_view() {
        let mut viewer = ImageViewer::default();
        viewer.open(3, 4);
        viewer.on_removed(3, 3);
        assert_eq!(viewer.current(), Some(2));

        viewer.on_removed(0, 2);
        assert_eq!(viewer.current(), Some(1));

        viewer.on_removed(1, 1);
        assert_eq!(viewer.current(), Some(0));

        viewer.on_removed(0, 0);
        assert_eq!(viewer.current(), None);
    }

    #[test]
    fn removal_before_view_keeps_same_image() {
        let mut viewer = ImageViewer::default();
        viewer.open(1, 3);
        viewer.on_removed(2, 2);
        assert_eq!(viewer.current(), Some(1));
    }
}
