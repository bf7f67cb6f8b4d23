use crate::ppu::{self, FrameBuffer, PpuState};
use crate::RunConfig;
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::rect::Rect;
use sdl2::render::{Texture, TextureCreator, TextureValueError, WindowCanvas};
use sdl2::video::{FullscreenType, Window, WindowContext};
use sdl2::IntegerOrSdlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphicsError {
    #[error("error setting fullscreen mode: {msg}")]
    Fullscreen { msg: String },
    #[error("error creating renderer: {source}")]
    CreateRenderer {
        #[from]
        source: IntegerOrSdlError,
    },
    #[error("error creating frame texture: {source}")]
    CreateTexture {
        #[from]
        source: TextureValueError,
    },
    #[error("error updating frame texture: {msg}")]
    Texture { msg: String },
    #[error("error copying frame texture to renderer: {msg}")]
    CopyToCanvas { msg: String },
}

// The four shades of the original LCD, from lightest to darkest, indexed by
// the palette-resolved 2-bit color
const GB_COLOR_TO_RGB: [[u8; 3]; 4] = [
    [0x82, 0x78, 0x0D],
    [0x3A, 0x53, 0x36],
    [0x5C, 0x71, 0x22],
    [0x1C, 0x36, 0x28],
];

/// Create an SDL2 renderer from the given SDL2 window, with the display area
/// initialized to the lightest shade.
pub fn create_renderer(
    mut window: Window,
    run_config: &RunConfig,
) -> Result<WindowCanvas, GraphicsError> {
    if run_config.launch_fullscreen {
        let fullscreen_mode = if run_config.borderless_fullscreen {
            FullscreenType::Desktop
        } else {
            FullscreenType::True
        };
        window.set_fullscreen(fullscreen_mode).map_err(|msg| GraphicsError::Fullscreen { msg })?;
    }

    let mut canvas_builder = window.into_canvas();
    if run_config.vsync_enabled {
        canvas_builder = canvas_builder.present_vsync();
    }

    let mut canvas = canvas_builder.build()?;

    let [r, g, b] = GB_COLOR_TO_RGB[0];
    canvas.set_draw_color(Color::RGB(r, g, b));
    canvas.clear();
    canvas.present();

    Ok(canvas)
}

/// Create the 160x144 streaming texture that frames are written into.
pub fn create_frame_texture(
    texture_creator: &TextureCreator<WindowContext>,
) -> Result<Texture<'_>, GraphicsError> {
    let texture = texture_creator.create_texture_streaming(
        PixelFormatEnum::RGB24,
        ppu::SCREEN_WIDTH.into(),
        ppu::SCREEN_HEIGHT.into(),
    )?;
    Ok(texture)
}

fn frame_texture_updater(frame_buffer: &FrameBuffer) -> impl FnOnce(&mut [u8], usize) + '_ {
    move |pixels, pitch| {
        for (i, scanline) in frame_buffer.iter().enumerate() {
            for (j, shade) in scanline.iter().copied().enumerate() {
                let start = i * pitch + 3 * j;
                pixels[start..start + 3].copy_from_slice(&GB_COLOR_TO_RGB[usize::from(shade)]);
            }
        }
    }
}

/// Render the current frame to the SDL2 window, overwriting all previously
/// displayed data.
///
/// With VSync enabled this function will block until the next screen refresh.
pub fn render_frame(
    ppu_state: &PpuState,
    canvas: &mut WindowCanvas,
    texture: &mut Texture<'_>,
    run_config: &RunConfig,
) -> Result<(), GraphicsError> {
    texture
        .with_lock(None, frame_texture_updater(ppu_state.frame_buffer()))
        .map_err(|msg| GraphicsError::Texture { msg })?;

    let dst_rect = if run_config.force_integer_scaling {
        let (w, h) = canvas.window().size();
        determine_integer_scale_rect(w, h)
    } else {
        None
    };

    canvas.set_draw_color(Color::RGB(0, 0, 0));
    canvas.clear();
    canvas.copy(texture, None, dst_rect).map_err(|msg| GraphicsError::CopyToCanvas { msg })?;
    canvas.present();

    Ok(())
}

fn determine_integer_scale_rect(w: u32, h: u32) -> Option<Rect> {
    let screen_width: u32 = ppu::SCREEN_WIDTH.into();
    let screen_height: u32 = ppu::SCREEN_HEIGHT.into();

    let Some(scale) =
        (1..).take_while(|&scale| scale * screen_width <= w && scale * screen_height <= h).last()
    else {
        // Give up, display area is too small for 1x scale
        return None;
    };

    let scaled_width = scale * screen_width;
    let scaled_height = scale * screen_height;
    Some(Rect::new(
        ((w - scaled_width) / 2) as i32,
        ((h - scaled_height) / 2) as i32,
        scaled_width,
        scaled_height,
    ))
}

pub fn toggle_fullscreen(
    canvas: &mut WindowCanvas,
    run_config: &RunConfig,
) -> Result<(), GraphicsError> {
    let fullscreen_mode = if run_config.borderless_fullscreen {
        FullscreenType::Desktop
    } else {
        FullscreenType::True
    };

    let current_fullscreen = canvas.window().fullscreen_state();
    let new_fullscreen = match current_fullscreen {
        FullscreenType::Off => fullscreen_mode,
        FullscreenType::True | FullscreenType::Desktop => FullscreenType::Off,
    };
    canvas
        .window_mut()
        .set_fullscreen(new_fullscreen)
        .map_err(|msg| GraphicsError::Fullscreen { msg })
}
