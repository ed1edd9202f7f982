/*!
Image-like sources that can be handed to `texImage2D`.

Three provenances are supported: a PNG file, an `Image` whose source is a data URL, and an
`<img>`-style element pointing at a data URL. The last two usually come from a `Canvas2d` that
was re-encoded with `to_data_url`.

Decoding is asynchronous, like `HTMLImageElement.decode()`, and produces a `DecodedImage` whose
rows go from top to bottom.

*/
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine;
use data_url::DataUrl;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat};

/// Error that can happen while decoding an image source.
#[derive(Debug)]
pub enum DecodeError {
    /// The file couldn't be read.
    Io(PathBuf, io::Error),

    /// The `src` is not a valid data URL, or its base64 payload is corrupt.
    DataUrl(String),

    /// The data URL's MIME type is not an image type.
    UnsupportedMime(String),

    /// The bytes couldn't be decoded as an image.
    Image(image::ImageError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            DecodeError::Io(path, err) =>
                write!(formatter, "Could not read {}: {}", path.display(), err),
            DecodeError::DataUrl(msg) =>
                write!(formatter, "Malformed data URL: {}", msg),
            DecodeError::UnsupportedMime(mime) =>
                write!(formatter, "The data URL's MIME type {} is not an image type", mime),
            DecodeError::Image(err) =>
                write!(formatter, "The image could not be decoded: {}", err),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DecodeError::Io(_, err) => Some(err),
            DecodeError::Image(err) => Some(err),
            _ => None,
        }
    }
}

impl From<image::ImageError> for DecodeError {
    fn from(err: image::ImageError) -> DecodeError {
        DecodeError::Image(err)
    }
}

/// A decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl DecodedImage {
    /// Builds an image from rows given top to bottom.
    ///
    /// # Panics
    ///
    /// Panics if `pixels.len()` is not `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> DecodedImage {
        assert_eq!(pixels.len(), width as usize * height as usize);
        DecodedImage { width, height, pixels }
    }

    fn from_encoded_bytes(bytes: &[u8], format: Option<ImageFormat>) -> Result<DecodedImage, DecodeError> {
        let image = match format {
            Some(format) => image::load_from_memory_with_format(bytes, format)?,
            None => image::load_from_memory(bytes)?,
        };
        let image = image.to_rgba8();
        let (width, height) = image.dimensions();
        let pixels = image.pixels().map(|p| p.0).collect();
        Ok(DecodedImage { width, height, pixels })
    }

    /// Returns the width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the pixel at column `x` of row `y`, rows counted from the top.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Returns all pixels, top row first.
    #[inline]
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }
}

/// Where an `Image` gets its bytes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ImageSrc {
    Path(PathBuf),
    DataUrl(String),
}

/// Equivalent of `new Image()` with its `src` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    src: ImageSrc,
}

impl Image {
    /// An image loaded from a file.
    pub fn from_path<P>(path: P) -> Image where P: Into<PathBuf> {
        Image { src: ImageSrc::Path(path.into()) }
    }

    /// An image whose `src` is a `data:` URL.
    pub fn from_data_url<S>(url: S) -> Image where S: Into<String> {
        Image { src: ImageSrc::DataUrl(url.into()) }
    }

    /// Returns the `src`, for error messages.
    pub fn src(&self) -> String {
        match &self.src {
            ImageSrc::Path(path) => path.display().to_string(),
            ImageSrc::DataUrl(url) => url.clone(),
        }
    }

    /// Loads and decodes the image.
    pub async fn decode(&self) -> Result<DecodedImage, DecodeError> {
        match &self.src {
            ImageSrc::Path(path) => decode_file(path),
            ImageSrc::DataUrl(url) => decode_data_url(url),
        }
    }
}

/// Equivalent of `document.createElement('img')` with its `src` set.
///
/// Decodes the same way as `Image`, but is reported as a distinct provenance since browsers
/// don't always share the code path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImgElement {
    src: String,
}

impl ImgElement {
    /// An element whose `src` is a `data:` URL.
    pub fn new<S>(src: S) -> ImgElement where S: Into<String> {
        ImgElement { src: src.into() }
    }

    /// Returns the `src` attribute.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Decodes the element's image.
    pub async fn decode(&self) -> Result<DecodedImage, DecodeError> {
        decode_data_url(&self.src)
    }
}

/// One of the three provenances the suite uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// `new Image()` loading a PNG file.
    Png(Image),
    /// `new Image()` whose `src` is a canvas' data URL.
    Canvas(Image),
    /// An `<img>` element whose `src` is a canvas' data URL.
    Element(ImgElement),
}

impl ImageSource {
    /// Returns the section header printed before the source's cases.
    pub fn header(&self) -> &'static str {
        match self {
            ImageSource::Png(_) => "Image from png",
            ImageSource::Canvas(_) => "Image from canvas2d",
            ImageSource::Element(_) => "&lt;img&gt; from canvas2d",
        }
    }

    /// Returns what is being created, for failure messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ImageSource::Png(_) => "Image from png",
            ImageSource::Canvas(_) => "Image from canvas",
            ImageSource::Element(_) => "<img> from canvas",
        }
    }

    /// Returns the `src` of the underlying image, for failure messages.
    pub fn src(&self) -> String {
        match self {
            ImageSource::Png(image) | ImageSource::Canvas(image) => image.src(),
            ImageSource::Element(element) => element.src().to_owned(),
        }
    }

    /// Loads and decodes the underlying image.
    pub async fn decode(&self) -> Result<DecodedImage, DecodeError> {
        match self {
            ImageSource::Png(image) | ImageSource::Canvas(image) => image.decode().await,
            ImageSource::Element(element) => element.decode().await,
        }
    }
}

fn decode_file(path: &Path) -> Result<DecodedImage, DecodeError> {
    let bytes = fs::read(path).map_err(|e| DecodeError::Io(path.to_owned(), e))?;
    DecodedImage::from_encoded_bytes(&bytes, None)
}

fn decode_data_url(url: &str) -> Result<DecodedImage, DecodeError> {
    let url = DataUrl::process(url).map_err(|e| DecodeError::DataUrl(format!("{:?}", e)))?;

    let mime = url.mime_type();
    if mime.type_ != "image" {
        return Err(DecodeError::UnsupportedMime(format!("{}/{}", mime.type_, mime.subtype)));
    }
    let format = ImageFormat::from_mime_type(format!("{}/{}", mime.type_, mime.subtype));

    let (bytes, _) = url.decode_to_vec()
                        .map_err(|e| DecodeError::DataUrl(format!("{:?}", e)))?;
    DecodedImage::from_encoded_bytes(&bytes, format)
}

/// Pixel block returned by `Canvas2d::create_image_data`, four bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA bytes, rows top to bottom.
    pub data: Vec<u8>,
}

/// A minimal 2D canvas: a pixel store that can be written with `put_image_data` and encoded to a
/// PNG data URL.
#[derive(Debug, Clone)]
pub struct Canvas2d {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Canvas2d {
    /// Builds a transparent black canvas.
    pub fn new(width: u32, height: u32) -> Canvas2d {
        Canvas2d {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Returns a zeroed block of pixels.
    pub fn create_image_data(&self, width: u32, height: u32) -> ImageData {
        ImageData { width, height, data: vec![0; width as usize * height as usize * 4] }
    }

    /// Copies `image_data` to the canvas with its top-left corner at `(dx, dy)`. Pixels falling
    /// outside the canvas are dropped.
    pub fn put_image_data(&mut self, image_data: &ImageData, dx: u32, dy: u32) {
        for y in 0 .. image_data.height {
            let cy = match dy.checked_add(y) {
                Some(cy) if cy < self.height => cy,
                _ => break,
            };

            for x in 0 .. image_data.width {
                let cx = match dx.checked_add(x) {
                    Some(cx) if cx < self.width => cx,
                    _ => break,
                };

                let src = ((y * image_data.width + x) * 4) as usize;
                let dst = ((cy * self.width + cx) * 4) as usize;
                self.data[dst .. dst + 4].copy_from_slice(&image_data.data[src .. src + 4]);
            }
        }
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encodes the canvas as a `data:image/png;base64,...` URL.
    pub fn to_data_url(&self) -> Result<String, image::ImageError> {
        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(&self.data, self.width, self.height,
                                              ColorType::Rgba8)?;

        let mut url = String::from("data:image/png;base64,");
        base64::engine::general_purpose::STANDARD.encode_string(&png, &mut url);
        Ok(url)
    }
}

/// Builds a canvas whose upper half is `top` and lower half is `bottom`.
///
/// With a height of 2 this is the canvas the suite uploads: one row of each color.
pub fn two_color_canvas(width: u32, height: u32, top: [u8; 4], bottom: [u8; 4]) -> Canvas2d {
    let mut canvas = Canvas2d::new(width, height);
    let mut image_data = canvas.create_image_data(width, height);
    for (i, pixel) in image_data.data.chunks_mut(4).enumerate() {
        let row = i as u32 / width;
        pixel.copy_from_slice(if row < height / 2 { &top } else { &bottom });
    }
    canvas.put_image_data(&image_data, 0, 0);
    canvas
}
