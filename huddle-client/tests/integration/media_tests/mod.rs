mod test_acquire_and_release;
mod test_screen_share;
mod test_toggle_tracks;

use huddle_client::media::{MediaController, MediaEvent, MediaTrack};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// What a [`MediaController`] announced through its listener.
#[derive(Default)]
pub struct MediaLog {
    pub outward: RefCell<Vec<Vec<String>>>,
    pub screen_share_ended: Cell<usize>,
}

impl MediaLog {
    pub fn attach(media: &MediaController) -> Rc<Self> {
        let log = Rc::new(Self::default());
        let l = log.clone();
        media.set_listener(move |event| match event {
            MediaEvent::OutwardTracksChanged(tracks) => l
                .outward
                .borrow_mut()
                .push(tracks.iter().map(|t| t.id()).collect()),
            MediaEvent::ScreenShareEnded => l.screen_share_ended.set(l.screen_share_ended.get() + 1),
        });
        log
    }

    pub fn last_outward(&self) -> Vec<String> {
        self.outward.borrow().last().cloned().unwrap_or_default()
    }
}
