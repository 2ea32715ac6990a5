// 构建脚本: ez-ffmpeg 静态链接时补充 FFmpeg 依赖库
fn main() {
    // 仅在Windows MSVC环境下需要
    #[cfg(all(target_os = "windows", target_env = "msvc"))]
    {
        // x264 编码器 (静态FFmpeg依赖)
        println!("cargo:rustc-link-lib=dylib=libx264");

        // OLE 自动化和VFW
        println!("cargo:rustc-link-lib=dylib=oleaut32");
        println!("cargo:rustc-link-lib=dylib=vfw32");

        // Secure Channel (RTSP over TLS)
        println!("cargo:rustc-link-lib=dylib=secur32");
    }
}
