// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles: a GPU whose render targets are picture recorders.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::Rect;
use lamina_core::picture::{
    Canvas, PhysicalSize, Picture, PictureRecorder, ReleaseFn, TextureId,
};

use crate::gpu::{GpuContext, RenderTarget};

/// Everything the fake GPU was asked to do.
#[derive(Debug, Default)]
pub(crate) struct GpuLog {
    pub(crate) allocated: Vec<PhysicalSize>,
    pub(crate) released: Vec<TextureId>,
    pub(crate) rasterized: Vec<Rc<Picture>>,
}

#[derive(Debug)]
pub(crate) struct FakeGpu {
    log: Rc<RefCell<GpuLog>>,
    next_texture: u64,
    fail: bool,
}

impl FakeGpu {
    pub(crate) fn new() -> (Self, Rc<RefCell<GpuLog>>) {
        let log = Rc::new(RefCell::new(GpuLog::default()));
        let gpu = Self {
            log: log.clone(),
            next_texture: 0,
            fail: false,
        };
        (gpu, log)
    }

    /// A GPU whose allocations always fail.
    pub(crate) fn failing() -> (Self, Rc<RefCell<GpuLog>>) {
        let (mut gpu, log) = Self::new();
        gpu.fail = true;
        (gpu, log)
    }
}

impl GpuContext for FakeGpu {
    fn create_render_target(&mut self, size: PhysicalSize) -> Option<Box<dyn RenderTarget>> {
        if self.fail {
            return None;
        }
        self.next_texture += 1;
        self.log.borrow_mut().allocated.push(size);
        let bounds = Rect::new(0.0, 0.0, f64::from(size.width), f64::from(size.height));
        Some(Box::new(FakeTarget {
            texture: TextureId(self.next_texture),
            recorder: PictureRecorder::new(bounds),
            log: self.log.clone(),
        }))
    }
}

struct FakeTarget {
    texture: TextureId,
    recorder: PictureRecorder,
    log: Rc<RefCell<GpuLog>>,
}

impl RenderTarget for FakeTarget {
    fn canvas(&mut self) -> &mut dyn Canvas {
        &mut self.recorder
    }

    fn finish(self: Box<Self>) -> (TextureId, ReleaseFn) {
        let Self {
            texture,
            recorder,
            log,
        } = *self;
        log.borrow_mut().rasterized.push(recorder.finish());
        let release: ReleaseFn = Box::new(move |t| log.borrow_mut().released.push(t));
        (texture, release)
    }
}
