/// 将笔采样映射为宿主指针事件并注入系统
pub mod event_dispatcher;

/// 数位板驱动相关逻辑实现：匹配、热插拔、连接状态、读循环、报告解码
pub mod tablet_driver;

/// 原始输入接口实现（USB 设备枚举、打开、热插拔通知）
pub mod input_devices;

/// 数位板事件的抽象层，定义事件模型
pub mod event_model;

/// 配置文件
pub mod config;

// 数据流：
// `input_devices` 枚举/热插拔 -> `tablet_driver::matcher` 校验 -> `tablet_driver::connection` 持有句柄
// -> `tablet_driver::reader` 读出原始报告 -> `tablet_driver::decoder` 得到笔采样
// -> `event_dispatcher::mapper` 换算坐标并得出按键边沿 -> `event_dispatcher::uinput` 注入

// 热插拔回调和读循环运行在不同的执行上下文里，二者之间只通过 `Connection` 交接设备句柄，
// 不存在任何全局可变状态

// 目前只支持 CTL-672 一种设备，压感、倾斜都不处理，它被当成一只绝对坐标鼠标
